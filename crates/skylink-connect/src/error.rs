//! Error types for the skylink-connect crate

use std::time::Duration;
use thiserror::Error;

use crate::session::SessionState;

pub type Result<T> = std::result::Result<T, ConnectError>;

/// Failure of a unary call made through a target's executor
pub type CallError = skylink_core_resilience::ResilienceError<tonic::Status>;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("gRPC status error: {0}")]
    Status(#[from] tonic::Status),

    #[error("Cannot {operation} a streaming session that is {state}")]
    Usage {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Timed out after {0:?} waiting for the terminal stream response")]
    Timeout(Duration),

    #[error("Stream to {target} closed without a terminal response")]
    StreamClosed { target: String },

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error(transparent)]
    Call(#[from] CallError),
}

impl ConnectError {
    /// Caller-contract violation rather than a transport or remote failure
    pub fn is_usage(&self) -> bool {
        matches!(self, ConnectError::Usage { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ConnectError::Timeout(_) => true,
            ConnectError::Call(e) => e.is_timeout(),
            _ => false,
        }
    }
}
