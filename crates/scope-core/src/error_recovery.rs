//! Retry of transient read failures.
//!
//! Only [`AccessError::Comm`] is retried. Rejections, missing devices and parse
//! failures are returned on the first attempt.
//!
//! Writes never go through here: a relative move that timed out may still have
//! moved the stage, so repeating it is unsafe.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::AccessResult;

/// Defines a policy for retrying an operation.
///
/// # Example
///
/// ```rust
/// use scope_core::error_recovery::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     max_attempts: 5,
///     backoff_delay: Duration::from_millis(200),
/// };
/// assert!(policy.retries());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. `1` disables retries.
    pub max_attempts: u32,

    /// Constant delay between attempts.
    pub backoff_delay: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_delay: Duration::ZERO,
        }
    }

    /// Whether more than one attempt is made.
    pub fn retries(&self) -> bool {
        self.max_attempts > 1
    }
}

impl Default for RetryPolicy {
    /// Three attempts, 100 ms apart.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_delay: Duration::from_millis(100),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy is exhausted.
pub async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> AccessResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AccessResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts += 1;
                if !err.is_transient() || attempts >= max_attempts {
                    return Err(err);
                }
                tracing::debug!(
                    attempt = attempts,
                    max_attempts,
                    "Operation '{}' failed: {}. Retrying in {:?}",
                    operation,
                    err,
                    policy.backoff_delay
                );
                sleep(policy.backoff_delay).await;
            }
        }
    }
}
