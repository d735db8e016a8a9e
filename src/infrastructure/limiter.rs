//! Bounds the number of in-flight remote requests.

use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

/// A FIFO gate on concurrent work. Every remote-source call acquires a
/// permit before issuing its request and releases it on completion,
/// including on failure.
#[derive(Clone)]
pub struct Limiter {
    semaphore: Arc<Semaphore>,
}

impl Limiter {
    /// Creates a limiter allowing up to `max_concurrent` permits at once.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Suspends until a permit is available, then holds it until the guard
    /// is dropped.
    ///
    /// # Panics
    ///
    /// Panics only if the underlying semaphore has been closed, which this
    /// type never does.
    #[expect(clippy::unreachable, reason = "Limiter never calls Semaphore::close")]
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .unwrap_or_else(|_| unreachable!("limiter semaphore is never closed"))
    }
}
