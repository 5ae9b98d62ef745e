//! # Retry Executor
//!
//! Wraps a single fallible remote call with bounded retries and capped
//! exponential backoff. Every attempt first passes through the shared
//! [`RateLimiter`]. The executor knows nothing about what the call does.

use crate::config::TransferConfig;
use crate::error::{RemoteError, TransferError, TransferResult};
use crate::resilience::RateLimiter;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = Arc<dyn Fn(&RemoteError) -> bool + Send + Sync>;

/// Capped exponential backoff: `min(base * 2^(attempt - 1), max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(10_000))
    }
}

#[derive(Clone)]
pub struct RetryExecutor {
    limiter: Arc<RateLimiter>,
    backoff: BackoffPolicy,
    should_retry: RetryPredicate,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("limiter", &self.limiter)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Retries transient errors and gives up immediately on permanent ones
    pub fn new(limiter: Arc<RateLimiter>, backoff: BackoffPolicy) -> Self {
        Self {
            limiter,
            backoff,
            should_retry: Arc::new(RemoteError::is_retryable),
        }
    }

    pub fn from_config(config: &TransferConfig, limiter: Arc<RateLimiter>) -> Self {
        let executor = Self::new(
            limiter,
            BackoffPolicy::new(config.retry.base_delay(), config.retry.max_delay()),
        );
        if config.retry.respect_permanent_errors {
            executor
        } else {
            executor.retry_all()
        }
    }

    /// Replace the retry classification
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&RemoteError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Retry every error up to the attempt cap, whatever its kind
    pub fn retry_all(self) -> Self {
        self.with_predicate(|_| true)
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Run `op` up to `max_attempts` times (at least once).
    ///
    /// Returns the first success, [`TransferError::RetryExhausted`] when the
    /// final attempt fails, or [`TransferError::PermanentRemoteFailure`] as
    /// soon as the predicate rejects an error.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        max_attempts: u32,
        mut op: F,
    ) -> TransferResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.throttle().await;

            let source = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation = %operation, attempt, "🟢 Remote operation recovered");
                    } else {
                        debug!(operation = %operation, "Remote operation succeeded");
                    }
                    return Ok(value);
                }
                Err(source) => source,
            };

            if !(self.should_retry)(&source) {
                warn!(
                    operation = %operation,
                    attempt,
                    error = %source,
                    "🚫 Non-retryable remote error"
                );
                return Err(TransferError::PermanentRemoteFailure {
                    operation: operation.to_string(),
                    attempt,
                    source,
                });
            }

            if attempt >= max_attempts {
                error!(
                    operation = %operation,
                    attempts = attempt,
                    error = %source,
                    "🔴 Retries exhausted"
                );
                return Err(TransferError::RetryExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source,
                });
            }

            let delay = self.backoff.delay_for_attempt(attempt);
            warn!(
                operation = %operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %source,
                "🔁 Remote operation failed, backing off"
            );
            sleep(delay).await;
        }
    }
}
