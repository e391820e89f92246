//! Retry policy for catalog calls
//!
//! Only transient failures are retried. The delay before retry `n` is
//! `n * backoff_step`, so with the defaults (4 attempts, 300ms step) a failing
//! call waits 300ms, 600ms and 900ms before giving up.

use crate::config::RetryConfig;
use crate::{ApiError, ApiResult};
use std::future::Future;
use std::time::Duration;

/// Default maximum attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default linear backoff step
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(300);

/// Attempt ceiling, backoff function and transient-error predicate
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_step: Duration,
    is_transient: fn(&ApiError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
            is_transient: ApiError::is_transient,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom ceiling and step
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_step,
            ..Self::default()
        }
    }

    /// Builds the policy described by the `[retry]` config section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_step_ms),
        )
    }

    /// Replaces the transient-error predicate
    pub fn with_predicate(mut self, is_transient: fn(&ApiError) -> bool) -> Self {
        self.is_transient = is_transient;
        self
    }

    /// Returns the maximum number of attempts configured
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (1-indexed)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Whether a failure on `attempt` should be retried
    pub fn should_retry(&self, error: &ApiError, attempt: u32) -> bool {
        attempt < self.max_attempts && (self.is_transient)(error)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> ApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(&e, attempt) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        "Transient error on {}, retry {}/{} after {:?}: {}",
                        label,
                        attempt,
                        self.max_attempts - 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
