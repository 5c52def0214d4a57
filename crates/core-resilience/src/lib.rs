//! Skylink Core Resilience: Pure-logic fault tolerance primitives
//!
//! # Overview
//!
//! This crate provides the building blocks that keep outbound RPC calls from
//! destabilizing the caller when the remote service is failing:
//!
//! - **Circuit Breaker**: Counts consecutive failures and fails fast while a target is unhealthy
//! - **Retry Policy**: Decides whether a failure is worth retrying and how long to wait (linear backoff)
//! - **Timeout Race**: Resolves each attempt exactly once, by completion or by deadline
//! - **Resilient Executor**: Composes the three around a repeatable operation factory
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - The RPC transport (connections, load balancing, TLS)
//! - Request/response shapes
//! - Where configuration comes from
//!
//! The only transport-aware piece is the optional `tonic` feature, which maps
//! `tonic::Status` codes onto the retry classification table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Service client call             │
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Circuit Breaker                   │  ← Fail-fast protection
//! │  (Tracks failures, opens on threshold)  │
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Timeout Race                      │  ← Exactly-once resolution
//! │  (Operation vs. deadline)               │
//! └─────────────┬───────────────────────────┘
//!               │ on failure
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Retry Policy                      │  ← Bounded, linear backoff
//! │  (Classify, then wait and re-invoke)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use skylink_core_resilience::{
//!     CircuitBreakerConfig, ResilienceError, ResilientExecutor, RetryConfig,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), ResilienceError<std::io::Error>> {
//! let executor = ResilientExecutor::new(
//!     CircuitBreakerConfig {
//!         failure_threshold: 5,
//!         open_duration: Duration::from_secs(30),
//!     },
//!     RetryConfig {
//!         max_attempts: 3,
//!         base_delay: Duration::from_millis(1000),
//!     },
//! );
//!
//! // The factory is called once per attempt
//! let answer = executor
//!     .execute(|| async { Ok::<_, std::io::Error>(42) }, Duration::from_secs(60))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod error;
pub mod executor;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use circuit_breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use error::{AttemptFailure, ResilienceError};
pub use executor::ResilientExecutor;
pub use retry::{classify, ErrorClass, RetryConfig, RetryPolicy, StatusCategory, TransportStatus};
pub use timeout::{race_timeout, TimedOut};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use skylink_core_resilience::prelude::*;
/// ```
pub mod prelude {
    pub use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
    pub use super::error::{AttemptFailure, ResilienceError};
    pub use super::executor::ResilientExecutor;
    pub use super::retry::{ErrorClass, RetryConfig, RetryPolicy, StatusCategory, TransportStatus};
    pub use super::timeout::race_timeout;
}
