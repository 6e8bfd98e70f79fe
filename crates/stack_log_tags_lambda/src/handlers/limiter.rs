use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

/// Optional cap on in-flight provider requests.
///
/// Permits are held for a single request only, never across a recursive
/// wait, so a nested stack can not starve its own children.
#[derive(Debug, Clone, Default)]
pub struct RequestLimiter {
    semaphore: Option<Arc<Semaphore>>,
}

impl RequestLimiter {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `None` or zero means unbounded.
    pub fn new(max_concurrency: Option<usize>) -> Self {
        Self {
            semaphore: max_concurrency
                .filter(|limit| *limit > 0)
                .map(|limit| Arc::new(Semaphore::new(limit))),
        }
    }

    pub fn available_permits(&self) -> Option<usize> {
        self.semaphore
            .as_ref()
            .map(|semaphore| semaphore.available_permits())
    }

    pub async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        match &self.semaphore {
            // The semaphore is never closed.
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        }
    }
}
