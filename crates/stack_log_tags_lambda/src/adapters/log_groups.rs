use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use stack_log_tags_core::contract::TagSet;
use stack_log_tags_core::error::ProviderError;

#[async_trait]
pub trait LogGroupTagger: Send + Sync {
    async fn tag_log_group(
        &self,
        log_group_name: &str,
        tags: &TagSet,
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone)]
pub struct CloudWatchLogsTagger {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogsTagger {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogGroupTagger for CloudWatchLogsTagger {
    // TagLogGroup addresses the group by name, which is the physical id
    // CloudFormation reports. TagResource would need the ARN instead.
    #[allow(deprecated)]
    async fn tag_log_group(
        &self,
        log_group_name: &str,
        tags: &TagSet,
    ) -> Result<(), ProviderError> {
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.client
            .tag_log_group()
            .log_group_name(log_group_name)
            .set_tags(Some(tags))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                ProviderError::tag(log_group_name, DisplayErrorContext(&error).to_string())
            })
    }
}

/// Tagger for `--dry-run`: logs what would be tagged and never calls AWS.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTagger;

#[async_trait]
impl LogGroupTagger for DryRunTagger {
    async fn tag_log_group(
        &self,
        log_group_name: &str,
        tags: &TagSet,
    ) -> Result<(), ProviderError> {
        tracing::info!(log_group = log_group_name, ?tags, "dry run, skipping TagLogGroup");
        Ok(())
    }
}
