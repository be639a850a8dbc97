//! Retry with exponential backoff under a cancellation token.
//!
//! [`with_retry`] runs an async operation until it succeeds, fails with an
//! error the caller's predicate deems permanent, runs out of attempts, or the
//! token is cancelled. Both the in-flight attempt and the wait between attempts
//! race the token, so cancellation is observed promptly.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Attempt budget and backoff curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// Four attempts, waiting 1s, 2s and 4s in between.
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Wait before the retry following zero-based `attempt`.
    ///
    /// `min(initial_delay * multiplier^attempt, max_delay)`. Values that overflow
    /// or turn negative clamp to `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Why [`with_retry`] gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error that must not be retried.
    #[error("{0}")]
    Permanent(E),

    /// Every allowed attempt failed; carries the last failure.
    #[error("max retry attempts ({attempts}) exceeded: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The token fired before the operation could succeed.
    #[error("retry cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

/// Runs `operation` until it succeeds or the policy says to stop.
///
/// `operation` receives the zero-based attempt index and is invoked exactly once
/// per attempt. A failure is retried only when `should_retry` returns true and
/// attempts remain; the wait between attempts is [`RetryPolicy::delay`].
/// A `max_attempts` of zero still makes one attempt.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    should_retry: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled { attempts: attempt });
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(attempt = attempt + 1, "Attempt aborted by cancellation");
                return Err(RetryError::Cancelled { attempts: attempt + 1 });
            }
            outcome = operation(attempt) => outcome,
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !should_retry(&err) {
            debug!(attempt = attempt + 1, error = %err, "Permanent failure, not retrying");
            return Err(RetryError::Permanent(err));
        }

        if attempt + 1 >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: max_attempts,
                last: err,
            });
        }

        let delay = policy.delay(attempt);
        debug!(
            "Attempt {}/{} failed: {}. Retrying in {:?}...",
            attempt + 1,
            max_attempts,
            err,
            delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt + 1 });
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
