//! Bounded retry with exponential backoff for store calls

use crate::error::StorageError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Retry settings for a single store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(5000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// The last error once a policy gives up
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub source: StorageError,
}

/// Whether a store error may succeed on a later attempt.
pub fn is_retryable(error: &StorageError) -> bool {
    match error {
        StorageError::IoError(_) => true,
        StorageError::Database(_) => true,
        StorageError::Unavailable(_) => true,
        StorageError::Serialization(_) => false,
        StorageError::InvalidPath(_) => false,
        StorageError::ForestNotFound(_) => false,
        StorageError::ItemNotFound { .. } => false,
    }
}

/// Run `operation` until it succeeds, hits a non-retryable error, or the
/// policy's attempts are used up. The closure receives the 1-based attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        debug!(operation = label, attempt, max_attempts, "Attempting store call");
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Store call failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    operation = label,
                    attempt,
                    max_attempts,
                    retryable = is_retryable(&err),
                    error = %err,
                    "Store call failed permanently"
                );
                return Err(RetryExhausted {
                    attempts: attempt,
                    source: err,
                });
            }
        }
    }
}
