use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const NESTED_STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";
pub const LOG_GROUP_RESOURCE_TYPE: &str = "AWS::Logs::LogGroup";
pub const DEFAULT_STAGE: &str = "dev";

/// Tag key to tag value, fixed for the whole run.
pub type TagSet = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackResourceSummary {
    pub logical_resource_id: String,
    /// Absent while the resource is still being created or after it failed.
    pub physical_resource_id: Option<String>,
    pub resource_type: String,
}

impl StackResourceSummary {
    pub fn new(
        logical_resource_id: impl Into<String>,
        physical_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            logical_resource_id: logical_resource_id.into(),
            physical_resource_id: Some(physical_resource_id.into()),
            resource_type: resource_type.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from_resource_type(&self.resource_type)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    NestedStack,
    LogGroup,
    Other,
}

impl ResourceKind {
    pub fn from_resource_type(resource_type: &str) -> Self {
        match resource_type {
            NESTED_STACK_RESOURCE_TYPE => Self::NestedStack,
            LOG_GROUP_RESOURCE_TYPE => Self::LogGroup,
            _ => Self::Other,
        }
    }
}

/// One response of the paginated listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePage {
    pub summaries: Vec<StackResourceSummary>,
    pub next_token: Option<String>,
}

impl ResourcePage {
    /// Continuation token, with an empty token treated as the last page.
    pub fn continuation(&self) -> Option<&str> {
        self.next_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Everything a single tagging run needs, resolved before any network call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRunRequest {
    pub stack_name: String,
    pub tags: TagSet,
}

impl TagRunRequest {
    pub fn new(stack_name: impl Into<String>, tags: TagSet) -> Result<Self, ValidationError> {
        let stack_name = stack_name.into().trim().to_string();
        if stack_name.is_empty() {
            return Err(ValidationError::new("stack_name cannot be empty"));
        }
        crate::tags::validate_tag_set(&tags)?;
        Ok(Self { stack_name, tags })
    }
}

/// Stack name the Serverless Framework assigns to a service: `{service}-{stage}`.
pub fn serverless_stack_name(
    service: &str,
    stage: Option<&str>,
) -> Result<String, ValidationError> {
    let service = service.trim();
    if service.is_empty() {
        return Err(ValidationError::new("service name cannot be empty"));
    }
    let stage = stage
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_STAGE);
    Ok(format!("{service}-{stage}"))
}
