use serde::{Deserialize, Serialize};

use crate::error::{AggregateError, Operation, ProviderError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    pub operation: Operation,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    pub message: String,
}

impl FailureRecord {
    pub fn from_error(error: &ProviderError, logical_resource_id: Option<&str>) -> Self {
        Self {
            operation: error.operation,
            target: error.target.clone(),
            logical_resource_id: logical_resource_id.map(str::to_string),
            message: error.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedResource {
    pub stack_name: String,
    pub logical_resource_id: String,
    pub resource_type: String,
    pub reason: String,
}

/// Outcome of a run, successes and failures alike.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub listed_stacks: Vec<String>,
    pub tagged_log_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.listed_stacks.extend(other.listed_stacks);
        self.tagged_log_groups.extend(other.tagged_log_groups);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }

    /// Provider calls attempted: successful listings, successful tags and failures.
    pub fn operation_count(&self) -> usize {
        self.listed_stacks.len() + self.tagged_log_groups.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All-or-nothing view of the report.
    pub fn into_result(self) -> Result<DispatchReport, AggregateError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AggregateError { report: self })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_both_sides() {
        let mut root = DispatchReport {
            listed_stacks: vec!["root".to_string()],
            tagged_log_groups: vec!["/aws/lambda/fnA".to_string()],
            ..DispatchReport::default()
        };
        root.merge(DispatchReport {
            listed_stacks: vec!["nested-1".to_string()],
            tagged_log_groups: vec!["/aws/lambda/fnC".to_string()],
            ..DispatchReport::default()
        });

        assert_eq!(root.listed_stacks, vec!["root", "nested-1"]);
        assert_eq!(root.tagged_log_groups, vec!["/aws/lambda/fnA", "/aws/lambda/fnC"]);
        assert!(root.clone().into_result().is_ok());
    }

    #[test]
    fn any_failure_fails_the_whole_report() {
        let report = DispatchReport {
            tagged_log_groups: vec!["/aws/lambda/fnA".to_string()],
            failures: vec![FailureRecord::from_error(
                &ProviderError::list("nested-1", "throttled"),
                None,
            )],
            ..DispatchReport::default()
        };

        let error = report.into_result().expect_err("report should fail");
        assert_eq!(error.report.tagged_log_groups.len(), 1);
        assert_eq!(error.failures()[0].operation, Operation::ListStackResources);
    }

    #[test]
    fn serialized_report_omits_empty_failures() {
        let report = DispatchReport {
            listed_stacks: vec!["root".to_string()],
            ..DispatchReport::default()
        };
        let json = serde_json::to_value(&report).expect("report should serialize");
        assert!(json.get("failures").is_none());
        assert_eq!(json["listed_stacks"][0], "root");
    }
}
