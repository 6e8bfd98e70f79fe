use serde::{Deserialize, Serialize};

use crate::report::{DispatchReport, FailureRecord};

/// Provider call that can fail during a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operation {
    ListStackResources,
    TagLogGroup,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ListStackResources => "ListStackResources",
            Self::TagLogGroup => "TagLogGroup",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed for '{target}': {message}")]
pub struct ProviderError {
    pub operation: Operation,
    pub target: String,
    pub message: String,
}

impl ProviderError {
    pub fn list(stack_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: Operation::ListStackResources,
            target: stack_name.into(),
            message: message.into(),
        }
    }

    pub fn tag(log_group_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: Operation::TagLogGroup,
            target: log_group_name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// At least one listing or tagging call failed. Carries the whole report,
/// successes included, once every sibling operation has settled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{} of {} operations failed ({} log groups tagged, {} stacks listed)",
    .report.failures.len(),
    .report.operation_count(),
    .report.tagged_log_groups.len(),
    .report.listed_stacks.len()
)]
pub struct AggregateError {
    pub report: DispatchReport,
}

impl AggregateError {
    pub fn failures(&self) -> &[FailureRecord] {
        &self.report.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_operation_and_target() {
        let error = ProviderError::tag("/aws/lambda/fnA", "AccessDenied");
        assert_eq!(
            error.to_string(),
            "TagLogGroup failed for '/aws/lambda/fnA': AccessDenied"
        );
    }

    #[test]
    fn aggregate_error_summarises_counts() {
        let mut report = DispatchReport::default();
        report.listed_stacks.push("root".to_string());
        report.tagged_log_groups.push("/aws/lambda/fnA".to_string());
        report.failures.push(FailureRecord::from_error(
            &ProviderError::tag("/aws/lambda/fnB", "boom"),
            Some("B"),
        ));

        let error = AggregateError { report };
        assert_eq!(
            error.to_string(),
            "1 of 3 operations failed (1 log groups tagged, 1 stacks listed)"
        );
        assert_eq!(error.failures()[0].logical_resource_id.as_deref(), Some("B"));
    }
}
