use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::ReservationResult;

/// Bounded retry for lost races: how many tries in total and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// A single attempt, conflicts surface immediately
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

/// Runs `op` until it stops reporting a conflict or the attempts run out.
///
/// `NotFound` and `Unavailable` are returned on first sight.
pub async fn retry_on_conflict<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ReservationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ReservationResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                debug!(attempt, max_attempts, error = %e, "Retrying after conflict");
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}
