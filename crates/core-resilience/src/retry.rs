//! Retry policy and error classification
//!
//! The policy answers two questions for a failed attempt: should it be
//! retried, and how long to wait first. Delays grow linearly from the base
//! delay (`base * (attempt + 1)`), not geometrically.
//!
//! Classification works off a small closed set of transport status
//! categories. Anything that cannot be placed in a category falls into the
//! default bucket, which is retried too.

use std::time::Duration;

/// Whether a failure is worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient failure, may succeed on retry
    Retryable,
    /// Explicit rejection, retrying will not help
    NonRetryable,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        self == ErrorClass::Retryable
    }
}

/// Transport-level status categories understood by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Target unreachable or refusing connections
    Unavailable,
    /// Transport-side deadline expired
    DeadlineExceeded,
    /// Target is shedding load or out of quota
    ResourceExhausted,
    /// Transport reported an unclassified failure
    Unknown,
    /// Application-level rejection (invalid argument, not found, denied, ...)
    Rejected,
}

impl StatusCategory {
    /// Retry class for this category
    pub fn class(self) -> ErrorClass {
        match self {
            StatusCategory::Unavailable
            | StatusCategory::DeadlineExceeded
            | StatusCategory::ResourceExhausted
            | StatusCategory::Unknown => ErrorClass::Retryable,
            StatusCategory::Rejected => ErrorClass::NonRetryable,
        }
    }
}

/// Errors that can report a transport status category
///
/// Returning `None` puts the error in the default bucket, which is retryable.
pub trait TransportStatus {
    fn status_category(&self) -> Option<StatusCategory>;
}

/// Default classifier: category table with a retryable fallback
pub fn classify<E: TransportStatus + ?Sized>(error: &E) -> ErrorClass {
    error
        .status_category()
        .map_or(ErrorClass::Retryable, StatusCategory::class)
}

#[cfg(feature = "tonic")]
impl TransportStatus for tonic::Status {
    fn status_category(&self) -> Option<StatusCategory> {
        use tonic::Code;

        Some(match self.code() {
            Code::Unavailable => StatusCategory::Unavailable,
            Code::DeadlineExceeded => StatusCategory::DeadlineExceeded,
            Code::ResourceExhausted => StatusCategory::ResourceExhausted,
            Code::Unknown => StatusCategory::Unknown,
            _ => StatusCategory::Rejected,
        })
    }
}

impl TransportStatus for std::io::Error {
    fn status_category(&self) -> Option<StatusCategory> {
        use std::io::ErrorKind::*;

        match self.kind() {
            ConnectionRefused | ConnectionReset | ConnectionAborted | NotConnected
            | BrokenPipe => Some(StatusCategory::Unavailable),
            TimedOut => Some(StatusCategory::DeadlineExceeded),
            _ => None,
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_attempts: u32,
    /// Delay before the first retry; later retries wait a multiple of it
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Retry decision logic. Holds no per-call state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(RetryConfig {
            max_attempts: 0,
            base_delay: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// `attempt` is the number of retries already performed (0-based).
    pub fn should_retry(&self, attempt: u32, class: ErrorClass) -> bool {
        attempt < self.config.max_attempts && class.is_retryable()
    }

    /// Classify `error` with the default table, then decide
    pub fn should_retry_error<E: TransportStatus + ?Sized>(&self, attempt: u32, error: &E) -> bool {
        self.should_retry(attempt, classify(error))
    }

    /// Wait before retry number `attempt + 1`: `base_delay * (attempt + 1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.config
            .base_delay
            .saturating_mul(attempt.saturating_add(1))
    }
}
