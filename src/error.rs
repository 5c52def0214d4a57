/*!
 * Error types for Skylink
 */

use std::io;

use thiserror::Error;

use skylink_connect::{CallError, ConnectError};

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unary call failed (circuit open, timeout, rejection, or exhausted retries)
    #[error("Call failed: {0}")]
    Call(#[source] CallError),

    /// Streaming session failed or was misused
    #[error("Streaming session error: {0}")]
    Session(#[source] ConnectError),
}

impl SdkError {
    /// Check if the call was rejected by an open circuit breaker
    pub fn is_circuit_open(&self) -> bool {
        match self {
            SdkError::Call(e) => e.is_circuit_open(),
            SdkError::Session(ConnectError::Call(e)) => e.is_circuit_open(),
            _ => false,
        }
    }

    /// Check if the failure was (or ended with) a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            SdkError::Call(e) => e.is_timeout(),
            SdkError::Session(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Check if this is a caller-contract violation
    pub fn is_usage(&self) -> bool {
        matches!(self, SdkError::Session(e) if e.is_usage())
    }

    /// gRPC status of the last remote failure, if there was one
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            SdkError::Call(e) => e.operation_error(),
            SdkError::Session(ConnectError::Status(s)) => Some(s),
            SdkError::Session(ConnectError::Call(e)) => e.operation_error(),
            _ => None,
        }
    }
}

impl From<CallError> for SdkError {
    fn from(err: CallError) -> Self {
        SdkError::Call(err)
    }
}

impl From<ConnectError> for SdkError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Call(e) => SdkError::Call(e),
            other => SdkError::Session(other),
        }
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(err: toml::de::Error) -> Self {
        SdkError::Config(format!("Invalid TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylink_core_resilience::{AttemptFailure, ResilienceError};
    use std::error::Error;
    use std::time::Duration;

    #[test]
    fn test_circuit_open_detection() {
        let err = SdkError::from(ResilienceError::<tonic::Status>::CircuitOpen);
        assert!(err.is_circuit_open());
        assert!(!err.is_timeout());
        assert!(err.status().is_none());
    }

    #[test]
    fn test_status_from_exhausted_retries() {
        let err = SdkError::from(ResilienceError::RetriesExhausted {
            attempts: 4,
            last: AttemptFailure::Operation(tonic::Status::unavailable("dock offline")),
        });
        assert_eq!(err.status().map(|s| s.code()), Some(tonic::Code::Unavailable));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_connect_call_error_is_flattened() {
        let err = SdkError::from(ConnectError::Call(ResilienceError::RetriesExhausted {
            attempts: 1,
            last: AttemptFailure::Timeout(Duration::from_secs(60)),
        }));
        assert!(matches!(err, SdkError::Call(_)));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_usage_detection() {
        let err = SdkError::from(ConnectError::Usage {
            operation: "send on",
            state: skylink_connect::SessionState::Completed,
        });
        assert!(err.is_usage());
        assert_eq!(
            err.to_string(),
            "Streaming session error: Cannot send on a streaming session that is completed"
        );
    }
}
