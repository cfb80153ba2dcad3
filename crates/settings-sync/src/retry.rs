//! Bounded retry with exponential backoff for revalidation.

use std::future::Future;

use tracing::warn;

use crate::config::RetryConfig;
use crate::error::SyncError;

/// Retries an operation while its error is retryable.
///
/// Authentication failures, malformed responses and refused patches are
/// returned on the first occurrence. Patch submission never goes through
/// this policy.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` is reached.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && tries < self.config.max_attempts => {
                    let delay = self.config.delay_for(tries);
                    warn!(
                        operation,
                        attempt = tries,
                        max_attempts = self.config.max_attempts,
                        "Attempt failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    tries += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }
}
