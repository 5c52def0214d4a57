/*!
 * Skylink - Resilient client SDK for remote flight operations
 *
 * Client-side access to three remote services:
 * - Remote control: flight commands, dock and asset operations, manual control streams
 * - Mission autonomy: missions, tasks and schedulers
 * - Live data: video streams, camera control and telemetry subscriptions
 *
 * Every call runs through a per-service circuit breaker, bounded retry with
 * linear backoff, and a per-attempt timeout (see `skylink-core-resilience`).
 * Transports are pluggable: a gRPC adapter implements the transport traits
 * and the SDK handles the rest.
 */

pub mod client;
pub mod config;
pub mod error;
pub mod live_data;
pub mod logging;
pub mod mission;
pub mod models;
pub mod remote_control;
pub mod service;

// Re-export commonly used types
pub use client::{SkylinkClient, SkylinkClientBuilder};
pub use config::{ClientConfig, LoadBalancerType, LogLevel, LoggingConfig, ResilienceSettings, ServiceConfig};
pub use error::{Result, SdkError};
pub use live_data::{LiveData, LiveDataTransport, TelemetryStream};
pub use mission::{MissionAutonomy, MissionOp, MissionTransport, SchedulerOp, TaskOp};
pub use models::{CommandResponse, Envelope, ManualControlInput, RequestBase};
pub use remote_control::{RemoteCommand, RemoteControl, RemoteControlTransport};
pub use service::CallContext;

pub use skylink_connect::{SessionState, StreamingSession, TargetHealth, TargetStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
