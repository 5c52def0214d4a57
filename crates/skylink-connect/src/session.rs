//! StreamingSession: one outbound message stream plus one terminal response
//!
//! # State machine
//!
//! ```text
//!            send*
//!           ┌─────┐
//!           ▼     │
//!        ┌──────────┐  complete()  ┌────────────┐  response   ┌───────────┐
//!  open ─▶│   Open   │─────────────▶│ Completing │────────────▶│ Completed │
//!        └──────────┘              └────────────┘             └───────────┘
//!             │                          │ timeout / error
//!             │ fail() / stream error    ▼
//!             └────────────────────▶┌────────┐
//!                                   │ Failed │
//!                                   └────────┘
//! ```
//!
//! Only `close()` is valid once the session has left `Open`; `send`,
//! `complete` and `fail` return a usage error instead. Dropping an open
//! session half-closes the stream, so an early return or panic inside a send
//! loop still ends the outbound side cleanly.

use std::fmt;
use std::time::Duration;

use skylink_core_resilience::race_timeout;
use tokio::sync::{mpsc, oneshot};
use tonic::Status;
use tracing::{debug, info, warn};

use crate::channel::{OutboundFrame, StreamHandle, StreamOpener};
use crate::error::{ConnectError, Result};

/// Default bound on the wait for the terminal response
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle state of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting outbound messages
    Open,
    /// Half-close sent, waiting for the terminal response
    Completing,
    /// Terminal response received
    Completed,
    /// Failed by the caller, the stream, or the completion timeout
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Completing => "completing",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A long-lived client stream to one target
///
/// # Example
///
/// ```rust,no_run
/// use skylink_connect::{StreamOpener, StreamingSession};
/// use std::time::Duration;
///
/// # async fn example(opener: &dyn StreamOpener<String, u32>) -> anyhow::Result<()> {
/// let mut session = StreamingSession::open("dock-7", opener, Duration::from_secs(30)).await?;
/// session.send("stick: 0.1".to_string())?;
/// session.send("stick: 0.2".to_string())?;
/// let accepted = session.complete().await?;
/// # Ok(())
/// # }
/// ```
pub struct StreamingSession<M, R> {
    target: String,
    sink: Option<mpsc::UnboundedSender<OutboundFrame<M>>>,
    response: Option<oneshot::Receiver<std::result::Result<R, Status>>>,
    /// Successful response that arrived before `complete()`
    early: Option<R>,
    state: SessionState,
    completion_timeout: Duration,
    sent: u64,
}

impl<M, R> StreamingSession<M, R> {
    /// Open a stream to `target` through `opener`
    pub async fn open<O>(
        target: impl Into<String>,
        opener: &O,
        completion_timeout: Duration,
    ) -> Result<Self>
    where
        O: StreamOpener<M, R> + ?Sized,
    {
        let target = target.into();
        let handle = opener.open_stream(&target).await?;
        Ok(Self::from_handle(target, handle, completion_timeout))
    }

    /// Wrap an already-opened stream
    pub fn from_handle(
        target: impl Into<String>,
        handle: StreamHandle<M, R>,
        completion_timeout: Duration,
    ) -> Self {
        let target = target.into();
        debug!(target = %target, "Streaming session opened");

        Self {
            target,
            sink: Some(handle.sink),
            response: Some(handle.response),
            early: None,
            state: SessionState::Open,
            completion_timeout,
            sent: 0,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of messages pushed onto the stream
    pub fn messages_sent(&self) -> u64 {
        self.sent
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == SessionState::Open {
            Ok(())
        } else {
            Err(ConnectError::Usage {
                operation,
                state: self.state,
            })
        }
    }

    /// Take a terminal response the transport delivered while still open.
    ///
    /// A successful value is parked for `complete()`; an error status is
    /// returned so the caller can fail the session with it.
    fn take_early_response(&mut self) -> Option<Status> {
        let response = self.response.as_mut()?;
        match response.try_recv() {
            Ok(Ok(value)) => {
                self.response = None;
                self.early = Some(value);
                None
            }
            Ok(Err(status)) => {
                self.response = None;
                Some(status)
            }
            Err(_) => None,
        }
    }

    fn fail_with_status(&mut self, status: Status) -> ConnectError {
        warn!(target = %self.target, error = %status, "Stream ended with error before completion");
        self.state = SessionState::Failed;
        self.sink = None;
        self.response = None;
        ConnectError::Status(status)
    }

    /// Push one message. Fire-and-forget: no per-message acknowledgement.
    ///
    /// If the transport has already ended the stream with an error status,
    /// the session fails with that status. If it dropped its end without a
    /// terminal response, the session fails with `StreamClosed`.
    pub fn send(&mut self, message: M) -> Result<()> {
        self.ensure_open("send on")?;

        if let Some(status) = self.take_early_response() {
            return Err(self.fail_with_status(status));
        }

        let delivered = match &self.sink {
            Some(sink) => sink.send(OutboundFrame::Message(message)).is_ok(),
            None => false,
        };

        if !delivered {
            if let Some(status) = self.take_early_response() {
                return Err(self.fail_with_status(status));
            }

            warn!(target = %self.target, "Stream closed by transport while sending");
            self.sink = None;
            // A response that already arrived stays available to complete()
            if self.early.is_none() {
                self.state = SessionState::Failed;
                self.response = None;
            }
            return Err(ConnectError::StreamClosed {
                target: self.target.clone(),
            });
        }

        self.sent += 1;
        Ok(())
    }

    /// Half-close the stream and wait (bounded) for the terminal response
    pub async fn complete(&mut self) -> Result<R> {
        self.ensure_open("complete")?;

        info!(target = %self.target, sent = self.sent, "Completing streaming session");
        self.state = SessionState::Completing;
        self.sink = None;

        if let Some(value) = self.early.take() {
            self.state = SessionState::Completed;
            debug!(target = %self.target, "Terminal response received before completion");
            return Ok(value);
        }

        let Some(response) = self.response.take() else {
            self.state = SessionState::Failed;
            return Err(ConnectError::StreamClosed {
                target: self.target.clone(),
            });
        };

        match race_timeout(response, self.completion_timeout).await {
            Ok(Ok(Ok(value))) => {
                self.state = SessionState::Completed;
                debug!(target = %self.target, "Terminal response received");
                Ok(value)
            }
            Ok(Ok(Err(status))) => {
                self.state = SessionState::Failed;
                warn!(target = %self.target, error = %status, "Stream ended with error");
                Err(ConnectError::Status(status))
            }
            Ok(Err(_)) => {
                self.state = SessionState::Failed;
                warn!(target = %self.target, "Stream dropped without a terminal response");
                Err(ConnectError::StreamClosed {
                    target: self.target.clone(),
                })
            }
            Err(timed_out) => {
                self.state = SessionState::Failed;
                warn!(
                    target = %self.target,
                    timeout_ms = self.completion_timeout.as_millis() as u64,
                    "Timed out waiting for terminal response"
                );
                Err(ConnectError::Timeout(timed_out.0))
            }
        }
    }

    /// Abort the stream with `error`. Does not wait for a response.
    pub fn fail(&mut self, error: Status) -> Result<()> {
        self.ensure_open("fail")?;

        warn!(target = %self.target, error = %error, "Failing streaming session");
        self.state = SessionState::Failed;
        if let Some(sink) = self.sink.take() {
            // The transport may already be gone; the abort is best effort.
            let _ = sink.send(OutboundFrame::Abort(error));
        }
        self.response = None;
        Ok(())
    }

    /// Idempotent cleanup.
    ///
    /// An open session is half-closed without waiting for the response and
    /// moves to `Completing`; any other state is left untouched.
    pub fn close(&mut self) {
        if self.state == SessionState::Open {
            warn!(target = %self.target, "Closing incomplete streaming session");
            self.sink = None;
            self.state = SessionState::Completing;
        }
    }
}

impl<M, R> Drop for StreamingSession<M, R> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<M, R> fmt::Debug for StreamingSession<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingSession")
            .field("target", &self.target)
            .field("state", &self.state)
            .field("sent", &self.sent)
            .field("completion_timeout", &self.completion_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{stream_pair, StreamEndpoint};

    fn session(timeout_secs: u64) -> (StreamingSession<u32, String>, StreamEndpoint<u32, String>) {
        let (handle, endpoint) = stream_pair();
        (
            StreamingSession::from_handle("sn-1", handle, Duration::from_secs(timeout_secs)),
            endpoint,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_complete() {
        let (mut session, mut endpoint) = session(30);
        session.send(1).unwrap();
        session.send(2).unwrap();
        assert_eq!(session.messages_sent(), 2);

        let server = tokio::spawn(async move {
            let messages = endpoint.collect_messages().await.unwrap();
            endpoint.respond(Ok(format!("got {}", messages.len())));
        });

        assert_eq!(session.complete().await.unwrap(), "got 2");
        assert_eq!(session.state(), SessionState::Completed);
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_times_out() {
        let (mut session, _endpoint) = session(30);
        let start = tokio::time::Instant::now();

        let err = session.complete().await.unwrap_err();
        assert!(matches!(err, ConnectError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_complete_is_usage_error() {
        let (mut session, mut endpoint) = session(30);
        endpoint.respond(Ok("done".to_string()));
        session.complete().await.unwrap();

        let err = session.send(3).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_twice_is_usage_error() {
        let (mut session, mut endpoint) = session(30);
        endpoint.respond(Ok("done".to_string()));
        session.complete().await.unwrap();

        let err = session.complete().await.unwrap_err();
        assert!(matches!(
            err,
            ConnectError::Usage {
                state: SessionState::Completed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_aborts_stream() {
        let (mut session, mut endpoint) = session(30);
        session.send(1).unwrap();
        session.fail(Status::cancelled("operator")).unwrap();
        assert_eq!(session.state(), SessionState::Failed);

        let err = endpoint.collect_messages().await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::Cancelled);

        assert!(session.fail(Status::cancelled("again")).unwrap_err().is_usage());
        assert!(session.send(2).unwrap_err().is_usage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_response_fails_session() {
        let (mut session, mut endpoint) = session(30);
        endpoint.respond(Err(Status::invalid_argument("bad stick input")));

        let err = session.complete().await.unwrap_err();
        assert!(matches!(err, ConnectError::Status(ref s) if s.code() == tonic::Code::InvalidArgument));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_endpoint() {
        let (mut session, endpoint) = session(30);
        drop(endpoint);

        assert!(matches!(
            session.send(1).unwrap_err(),
            ConnectError::StreamClosed { .. }
        ));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_response_fails_open_session() {
        let (mut session, mut endpoint) = session(30);
        endpoint.respond(Err(Status::permission_denied("flight authority revoked")));

        let err = session.send(1).unwrap_err();
        assert!(matches!(err, ConnectError::Status(ref s) if s.code() == tonic::Code::PermissionDenied));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.messages_sent(), 0);
        assert!(session.send(2).unwrap_err().is_usage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_response_survives_dropped_endpoint() {
        let (mut session, mut endpoint) = session(30);
        session.send(1).unwrap();
        endpoint.respond(Err(Status::permission_denied("flight authority revoked")));
        drop(endpoint);

        let err = session.send(2).unwrap_err();
        assert!(matches!(err, ConnectError::Status(ref s) if s.code() == tonic::Code::PermissionDenied));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_response_kept_for_complete() {
        let (mut session, mut endpoint) = session(30);
        endpoint.respond(Ok("accepted".to_string()));

        session.send(1).unwrap();
        assert_eq!(session.state(), SessionState::Open);

        drop(endpoint);
        assert!(matches!(
            session.send(2).unwrap_err(),
            ConnectError::StreamClosed { .. }
        ));
        assert_eq!(session.state(), SessionState::Open);

        assert_eq!(session.complete().await.unwrap(), "accepted");
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent() {
        let (mut session, mut endpoint) = session(30);
        session.send(5).unwrap();

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Completing);
        assert_eq!(endpoint.collect_messages().await.unwrap(), vec![5]);
        assert!(session.send(6).unwrap_err().is_usage());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_half_closes() {
        let (mut session, mut endpoint) = session(30);
        session.send(9).unwrap();
        drop(session);

        assert_eq!(endpoint.collect_messages().await.unwrap(), vec![9]);
    }
}
