//! Bounded retry with exponential backoff for platform API calls
//!
//! [`RetryPolicy::run`] retries [`ApiError::is_transient`] failures and is
//! meant for reads. Mutating calls go through [`RetryPolicy::run_when`] with
//! [`ApiError::is_unapplied`], so a request the platform may already have
//! acted on is never sent twice. The final error is returned unchanged.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::inventory::ApiError;

/// Retry settings for outbound platform calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based), without jitter.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff with up to 10% random jitter added.
    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.retry_delay(attempt);
        let spread = (delay.as_millis() / 10) as u64;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..=spread))
    }

    /// Run `call` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.run_when(operation, ApiError::is_transient, call).await
    }

    /// Like [`run`](Self::run), retrying only errors accepted by `retryable`.
    pub async fn run_when<T, F, Fut, R>(
        &self,
        operation: &str,
        retryable: R,
        mut call: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        R: Fn(&ApiError) -> bool,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if retryable(&err) && attempt < self.max_retries => {
                    let delay = self.jittered_delay(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Platform call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if attempt > 0 {
                        tracing::warn!(
                            operation,
                            attempts = attempt + 1,
                            error = %err,
                            "Platform call failed after retries"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
