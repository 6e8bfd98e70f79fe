use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use stack_log_tags_core::contract::{ResourcePage, StackResourceSummary};
use stack_log_tags_core::error::ProviderError;

/// One page of `ListStackResources`.
#[async_trait]
pub trait StackResourcePages: Send + Sync {
    async fn list_page(
        &self,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> Result<ResourcePage, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct CloudFormationStackResources {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStackResources {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StackResourcePages for CloudFormationStackResources {
    async fn list_page(
        &self,
        stack_name: &str,
        next_token: Option<&str>,
    ) -> Result<ResourcePage, ProviderError> {
        let output = self
            .client
            .list_stack_resources()
            .stack_name(stack_name)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|error| {
                ProviderError::list(stack_name, DisplayErrorContext(&error).to_string())
            })?;

        let summaries = output
            .stack_resource_summaries()
            .iter()
            .map(|summary| StackResourceSummary {
                logical_resource_id: summary
                    .logical_resource_id()
                    .unwrap_or_default()
                    .to_string(),
                physical_resource_id: summary.physical_resource_id().map(str::to_string),
                resource_type: summary.resource_type().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(ResourcePage {
            summaries,
            next_token: output.next_token().map(str::to_string),
        })
    }
}
