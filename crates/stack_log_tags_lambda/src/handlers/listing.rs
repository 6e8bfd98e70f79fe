use stack_log_tags_core::contract::StackResourceSummary;
use stack_log_tags_core::error::ProviderError;
use tracing::debug;

use crate::adapters::stack_resources::StackResourcePages;
use crate::handlers::limiter::RequestLimiter;

/// Lists every resource of `stack_name`, following continuation tokens until
/// the last page. Pages are fetched one after another and concatenated in
/// page order.
pub async fn list_stack_resources(
    pages: &dyn StackResourcePages,
    stack_name: &str,
) -> Result<Vec<StackResourceSummary>, ProviderError> {
    list_stack_resources_limited(pages, stack_name, &RequestLimiter::unbounded()).await
}

pub async fn list_stack_resources_limited(
    pages: &dyn StackResourcePages,
    stack_name: &str,
    limiter: &RequestLimiter,
) -> Result<Vec<StackResourceSummary>, ProviderError> {
    let mut summaries = Vec::new();
    let mut next_token: Option<String> = None;
    let mut page_number = 0usize;

    loop {
        let page = {
            let _permit = limiter.acquire().await;
            pages.list_page(stack_name, next_token.as_deref()).await?
        };
        page_number += 1;
        debug!(
            stack_name,
            page = page_number,
            resources = page.summaries.len(),
            "fetched stack resources page"
        );

        next_token = page.continuation().map(str::to_string);
        summaries.extend(page.summaries);
        if next_token.is_none() {
            return Ok(summaries);
        }
    }
}
