//! Skylink Connect: Client-side gRPC session plumbing
//!
//! This crate sits between the pure resilience primitives and the service
//! clients. It provides:
//!
//! - **StreamingSession**: A long-lived client stream (many outbound messages, one
//!   terminal response) with an explicit `Open → Completing → Completed/Failed`
//!   lifecycle and drop-time half-close
//! - **Stream channel pair**: The caller/transport ends a transport adapter plugs into
//! - **ExecutorRegistry**: One circuit breaker + retry policy per remote target
//!
//! # Example
//!
//! ```rust,no_run
//! use skylink_connect::{stream_pair, StreamingSession};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let (handle, mut endpoint) = stream_pair::<u32, String>();
//! let mut session = StreamingSession::from_handle("asset-42", handle, Duration::from_secs(30));
//!
//! tokio::spawn(async move {
//!     let inputs = endpoint.collect_messages().await.unwrap_or_default();
//!     endpoint.respond(Ok(format!("{} inputs applied", inputs.len())));
//! });
//!
//! session.send(1)?;
//! session.send(2)?;
//! let summary = session.complete().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
pub mod registry;
pub mod session;

pub use channel::{stream_pair, OutboundFrame, Responder, StreamEndpoint, StreamHandle, StreamOpener};
pub use error::{CallError, ConnectError, Result};
pub use registry::{ExecutorRegistry, TargetHealth, TargetStatus};
pub use session::{SessionState, StreamingSession, DEFAULT_COMPLETION_TIMEOUT};
