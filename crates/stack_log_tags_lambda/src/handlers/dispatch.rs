use futures::future::{join_all, BoxFuture, FutureExt};
use stack_log_tags_core::contract::{StackResourceSummary, TagSet};
use stack_log_tags_core::error::AggregateError;
use stack_log_tags_core::partition::{partition_resources, ResourceRef};
use stack_log_tags_core::report::{DispatchReport, FailureRecord};
use tracing::{debug, error, info, warn};

use crate::adapters::log_groups::LogGroupTagger;
use crate::adapters::stack_resources::StackResourcePages;
use crate::handlers::limiter::RequestLimiter;
use crate::handlers::listing::list_stack_resources_limited;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound on in-flight provider requests. `None` dispatches everything at once.
    pub max_concurrency: Option<usize>,
}

/// Walks a stack tree and tags every log group found in it.
///
/// Each nested stack and each log group is its own concurrent unit of work.
/// Failures are collected rather than short-circuiting, so the returned
/// report always reflects every operation once all of them have settled.
pub struct TagDispatcher<'a> {
    pages: &'a dyn StackResourcePages,
    tagger: &'a dyn LogGroupTagger,
    tags: &'a TagSet,
    limiter: RequestLimiter,
}

impl<'a> TagDispatcher<'a> {
    pub fn new(
        pages: &'a dyn StackResourcePages,
        tagger: &'a dyn LogGroupTagger,
        tags: &'a TagSet,
        options: &DispatchOptions,
    ) -> Self {
        Self {
            pages,
            tagger,
            tags,
            limiter: RequestLimiter::new(options.max_concurrency),
        }
    }

    /// Lists `stack_name` and dispatches over its resources.
    pub async fn tag_stack(&self, stack_name: &str) -> Result<DispatchReport, AggregateError> {
        self.process_stack(stack_name.to_string(), None)
            .await
            .into_result()
    }

    /// Dispatches over resources already listed for `stack_name`.
    pub async fn dispatch(
        &self,
        stack_name: &str,
        summaries: &[StackResourceSummary],
    ) -> Result<DispatchReport, AggregateError> {
        self.dispatch_resources(stack_name, summaries)
            .await
            .into_result()
    }

    fn process_stack(
        &self,
        stack_name: String,
        logical_resource_id: Option<String>,
    ) -> BoxFuture<'_, DispatchReport> {
        async move {
            info!(stack_name = %stack_name, "processing stack");
            match list_stack_resources_limited(self.pages, &stack_name, &self.limiter).await {
                Ok(summaries) => {
                    let mut report = DispatchReport {
                        listed_stacks: vec![stack_name.clone()],
                        ..DispatchReport::default()
                    };
                    report.merge(self.dispatch_resources(&stack_name, &summaries).await);
                    report
                }
                Err(failure) => {
                    error!(
                        stack_name = %stack_name,
                        logical_id = logical_resource_id.as_deref(),
                        error = %failure,
                        "failed to list stack resources"
                    );
                    DispatchReport {
                        failures: vec![FailureRecord::from_error(
                            &failure,
                            logical_resource_id.as_deref(),
                        )],
                        ..DispatchReport::default()
                    }
                }
            }
        }
        .boxed()
    }

    async fn dispatch_resources(
        &self,
        stack_name: &str,
        summaries: &[StackResourceSummary],
    ) -> DispatchReport {
        let mut partition = partition_resources(stack_name, summaries);
        let skipped = std::mem::take(&mut partition.skipped);
        for resource in &skipped {
            warn!(
                stack_name,
                logical_id = %resource.logical_resource_id,
                resource_type = %resource.resource_type,
                reason = %resource.reason,
                "skipping resource"
            );
        }

        if partition.is_leaf() {
            debug!(stack_name, "no nested stacks below this stack");
        }
        info!(
            stack_name,
            log_groups = partition.log_groups.len(),
            nested_stacks = partition.nested_stacks.len(),
            "updating log groups and nested stacks"
        );

        let mut operations: Vec<BoxFuture<'_, DispatchReport>> =
            Vec::with_capacity(partition.nested_stacks.len() + partition.log_groups.len());
        for stack in &partition.nested_stacks {
            operations.push(self.process_stack(
                stack.physical_resource_id.clone(),
                Some(stack.logical_resource_id.clone()),
            ));
        }
        for log_group in &partition.log_groups {
            operations.push(self.tag_log_group(log_group).boxed());
        }
        let outcomes = join_all(operations).await;

        let mut report = DispatchReport {
            skipped,
            ..DispatchReport::default()
        };
        for outcome in outcomes {
            report.merge(outcome);
        }
        report
    }

    async fn tag_log_group(&self, log_group: &ResourceRef) -> DispatchReport {
        let name = log_group.physical_resource_id.as_str();
        let logical_id = log_group.logical_resource_id.as_str();
        info!(log_group = name, logical_id, "tag log group begin");

        let result = {
            let _permit = self.limiter.acquire().await;
            self.tagger.tag_log_group(name, self.tags).await
        };

        match result {
            Ok(()) => {
                info!(log_group = name, logical_id, "tagged log group");
                DispatchReport {
                    tagged_log_groups: vec![name.to_string()],
                    ..DispatchReport::default()
                }
            }
            Err(failure) => {
                error!(log_group = name, logical_id, error = %failure, "failed to tag log group");
                DispatchReport {
                    failures: vec![FailureRecord::from_error(&failure, Some(logical_id))],
                    ..DispatchReport::default()
                }
            }
        }
    }
}
