//! Circuit Breaker implementation for fault tolerance
//!
//! The circuit breaker prevents cascading failures by failing fast when a remote
//! target is experiencing issues. It has two states:
//! - Closed: Normal operation, calls pass through
//! - Open: Target is unhealthy, calls are rejected until the open duration elapses
//!
//! Once the open duration has elapsed the breaker resets itself on the next
//! `allow()` and lets traffic through again. There is no single-probe half-open
//! phase: every caller arriving after the cooldown is admitted.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// State of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, calls pass through normally
    Closed,
    /// Circuit is open, calls fail immediately
    Open { opened_at: Instant },
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit (at least 1)
    pub failure_threshold: u32,
    /// How long the circuit stays open before calls are admitted again
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
        }
    }
}

/// Lifetime counters, kept outside the state lock
#[derive(Debug, Default)]
struct Counters {
    successes: AtomicU64,
    failures: AtomicU64,
    rejections: AtomicU64,
}

/// Snapshot of the breaker's lifetime counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakerStats {
    /// Total recorded successes
    pub successes: u64,
    /// Total recorded failures
    pub failures: u64,
    /// Calls rejected while open
    pub rejections: u64,
}

#[derive(Debug)]
struct CircuitBreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreakerState {
    fn new() -> Self {
        Self {
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    fn close(&mut self) {
        self.opened_at = None;
        self.consecutive_failures = 0;
    }
}

/// Circuit breaker shared by every call to one remote target
///
/// Cloning is cheap and every clone observes the same state, so a single
/// breaker can aggregate the health signal of all concurrent calls.
///
/// # Example
/// ```
/// use skylink_core_resilience::{CircuitBreaker, CircuitBreakerConfig};
/// use std::time::Duration;
///
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig {
///     failure_threshold: 2,
///     open_duration: Duration::from_secs(30),
/// });
///
/// breaker.record_failure();
/// assert!(breaker.allow());
/// breaker.record_failure();
/// assert!(!breaker.allow());
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<Mutex<CircuitBreakerState>>,
    counters: Arc<Counters>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// A `failure_threshold` of zero is treated as one.
    pub fn new(mut config: CircuitBreakerConfig) -> Self {
        config.failure_threshold = config.failure_threshold.max(1);
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(CircuitBreakerState::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create a new circuit breaker with default configuration
    pub fn new_default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// The configuration this breaker was built with
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Decide whether a call may proceed.
    ///
    /// Returns `false` only while the circuit is open and the open duration has
    /// not yet elapsed. When it has elapsed the circuit closes and the failure
    /// counter resets before the call is admitted.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();

        let Some(opened_at) = state.opened_at else {
            return true;
        };

        if opened_at.elapsed() >= self.config.open_duration {
            info!("Circuit breaker closing after open duration elapsed");
            state.close();
            true
        } else {
            self.counters.rejections.fetch_add(1, Ordering::Relaxed);
            debug!("Circuit breaker is open, rejecting call");
            false
        }
    }

    /// Record a successful call: resets the failure counter and closes the circuit
    pub fn record_success(&self) {
        self.counters.successes.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        if state.opened_at.is_some() {
            info!("Circuit breaker closing after successful call");
        } else if state.consecutive_failures > 0 {
            debug!("Call succeeded, resetting failure count");
        }
        state.close();
    }

    /// Record a failed call, opening the circuit once the threshold is reached
    pub fn record_failure(&self) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        let failures = state.consecutive_failures;

        debug!(
            failures,
            threshold = self.config.failure_threshold,
            "Call failed"
        );

        if failures >= self.config.failure_threshold && state.opened_at.is_none() {
            state.opened_at = Some(Instant::now());
            warn!(
                failures,
                open_for_ms = self.config.open_duration.as_millis() as u64,
                "Circuit breaker OPENED"
            );
        }
    }

    /// Get the current state of the circuit breaker
    ///
    /// This is a passive read; unlike [`allow`](Self::allow) it never closes an
    /// expired circuit.
    pub fn state(&self) -> CircuitState {
        match self.state.lock().opened_at {
            Some(opened_at) => CircuitState::Open { opened_at },
            None => CircuitState::Closed,
        }
    }

    /// Check whether the circuit is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().opened_at.is_some()
    }

    /// Get current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    /// Lifetime counters
    pub fn stats(&self) -> BreakerStats {
        BreakerStats {
            successes: self.counters.successes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            rejections: self.counters.rejections.load(Ordering::Relaxed),
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        self.state.lock().close();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, open_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            open_duration: Duration::from_secs(open_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_at_threshold() {
        let breaker = breaker(3, 30);

        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        assert!(!breaker.allow());
        assert!(matches!(breaker.state(), CircuitState::Open { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_open_past_threshold() {
        let breaker = breaker(2, 30);

        for _ in 0..7 {
            breaker.record_failure();
            if breaker.failure_count() >= 2 {
                assert!(!breaker.allow());
            }
        }
        assert_eq!(breaker.failure_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_self_reset() {
        let breaker = breaker(3, 30);
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert!(!breaker.allow());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!breaker.allow());
        assert_eq!(breaker.failure_count(), 3);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(breaker.allow());
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_keeps_original_stamp() {
        let breaker = breaker(1, 10);
        breaker.record_failure();
        let CircuitState::Open { opened_at } = breaker.state() else {
            panic!("expected open circuit");
        };

        tokio::time::advance(Duration::from_secs(5)).await;
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open { opened_at });

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(breaker.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_closes_and_resets() {
        let breaker = breaker(2, 60);
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());

        breaker.record_success();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.allow());
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        let breaker = breaker(0, 60);
        assert!(breaker.allow());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_concurrent_failures_not_lost() {
        let breaker = breaker(u32::MAX, 60);

        std::thread::scope(|s| {
            for _ in 0..8 {
                let breaker = breaker.clone();
                s.spawn(move || {
                    for _ in 0..250 {
                        breaker.record_failure();
                    }
                });
            }
        });

        assert_eq!(breaker.failure_count(), 2000);
        assert_eq!(breaker.stats().failures, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_count_rejections() {
        let breaker = breaker(1, 60);
        breaker.record_failure();
        assert!(!breaker.allow());
        assert!(!breaker.allow());
        breaker.reset();
        breaker.record_success();

        let stats = breaker.stats();
        assert_eq!(stats.rejections, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.successes, 1);
    }
}
