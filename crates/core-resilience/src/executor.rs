//! Resilient executor: circuit breaker + retry + timeout around an operation
//!
//! ```text
//! execute(factory, timeout)
//!   │
//!   ├─ breaker.allow()? ── no ──▶ CircuitOpen (factory never called)
//!   │
//!   └─ loop:
//!        factory() ──▶ race(operation, timeout)
//!          ├─ Ok      ──▶ record_success ──▶ return value
//!          └─ failure ──▶ record_failure
//!                          ├─ retryable && attempt < max ──▶ sleep(delay_for(attempt)), attempt += 1
//!                          ├─ non-retryable              ──▶ return the failure
//!                          └─ budget spent               ──▶ RetriesExhausted
//! ```
//!
//! Attempts of one call are strictly sequential, so attempt N's outcome is
//! recorded on the breaker before attempt N+1 starts. Delays are timer-driven
//! awaits and never hold a thread or a lock, so retries of one call do not
//! stall other calls sharing the same breaker.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::error::{AttemptFailure, ResilienceError};
use crate::retry::{classify, ErrorClass, RetryConfig, RetryPolicy, TransportStatus};
use crate::timeout::race_timeout;

/// Wraps outbound calls to one remote target
///
/// Cloning shares the circuit breaker, so every clone contributes to and
/// observes the same health signal.
#[derive(Debug, Clone, Default)]
pub struct ResilientExecutor {
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl ResilientExecutor {
    pub fn new(breaker: CircuitBreakerConfig, retry: RetryConfig) -> Self {
        Self::with_parts(CircuitBreaker::new(breaker), RetryPolicy::new(retry))
    }

    /// Build from an existing (possibly shared) breaker
    pub fn with_parts(breaker: CircuitBreaker, retry: RetryPolicy) -> Self {
        Self { breaker, retry }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run a fresh operation from `factory` per attempt, classifying failures
    /// with the default transport status table.
    ///
    /// # Example
    /// ```
    /// use skylink_core_resilience::ResilientExecutor;
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let executor = ResilientExecutor::default();
    /// let value = executor
    ///     .execute(|| async { Ok::<_, std::io::Error>(42) }, Duration::from_secs(5))
    ///     .await
    ///     .unwrap();
    /// assert_eq!(value, 42);
    /// # }
    /// ```
    pub async fn execute<F, Fut, T, E>(
        &self,
        factory: F,
        timeout: Duration,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: TransportStatus + fmt::Display,
    {
        self.execute_classified(factory, timeout, classify::<E>).await
    }

    /// Like [`execute`](Self::execute), with a caller-supplied classifier
    ///
    /// Timeouts are always retryable; only operation errors reach `classifier`.
    pub async fn execute_classified<F, Fut, T, E, C>(
        &self,
        mut factory: F,
        timeout: Duration,
        classifier: C,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        C: Fn(&E) -> ErrorClass,
    {
        if !self.breaker.allow() {
            return Err(ResilienceError::CircuitOpen);
        }

        let mut attempt: u32 = 0;
        loop {
            debug!(attempt, "Starting attempt");

            let failure = match race_timeout(factory(), timeout).await {
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Ok(Err(e)) => AttemptFailure::Operation(e),
                Err(_) => AttemptFailure::Timeout(timeout),
            };

            self.breaker.record_failure();

            let class = failure.classify_with(&classifier);
            if self.retry.should_retry(attempt, class) {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            // Timeouts always classify as retryable, so only an operation
            // error can end the loop early.
            return Err(match failure {
                AttemptFailure::Operation(e) if matches!(class, ErrorClass::NonRetryable) => {
                    debug!(error = %e, "Attempt failed with non-retryable error");
                    ResilienceError::Operation(e)
                }
                last => {
                    warn!(attempts = attempt + 1, error = %last, "All retry attempts failed");
                    ResilienceError::RetriesExhausted {
                        attempts: attempt + 1,
                        last,
                    }
                }
            });
        }
    }
}
