//! Client-streaming channel pair
//!
//! A client-streaming RPC has two halves: many outbound messages flowing from
//! the caller to the transport, and one terminal response flowing back.
//! [`stream_pair`] creates both ends:
//!
//! ```text
//!  StreamingSession                      transport adapter
//!  ┌──────────────┐   OutboundFrame<M>   ┌────────────────┐
//!  │ StreamHandle │ ───────────────────▶ │ StreamEndpoint │ ──▶ gRPC request stream
//!  │              │ ◀─────────────────── │                │ ◀── gRPC response
//!  └──────────────┘  Result<R, Status>   └────────────────┘
//!                     (single slot)
//! ```
//!
//! Dropping every sender half-closes the outbound side. The response slot is a
//! oneshot, so it is written at most once.

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tonic::Status;

/// One item on the outbound side of a stream
#[derive(Debug, Clone)]
pub enum OutboundFrame<M> {
    /// Regular message
    Message(M),
    /// Abnormal close; no further frames follow
    Abort(Status),
}

/// Caller-side ends of a client stream
#[derive(Debug)]
pub struct StreamHandle<M, R> {
    pub(crate) sink: mpsc::UnboundedSender<OutboundFrame<M>>,
    pub(crate) response: oneshot::Receiver<Result<R, Status>>,
}

/// Transport-side ends of a client stream
#[derive(Debug)]
pub struct StreamEndpoint<M, R> {
    inbound: mpsc::UnboundedReceiver<OutboundFrame<M>>,
    responder: Responder<R>,
}

/// Single-use writer for the terminal response
#[derive(Debug)]
pub struct Responder<R> {
    slot: Option<oneshot::Sender<Result<R, Status>>>,
}

impl<R> Responder<R> {
    /// Deliver the terminal response.
    ///
    /// Returns `false` if a response was already delivered or nobody is
    /// waiting for it anymore.
    pub fn respond(&mut self, response: Result<R, Status>) -> bool {
        match self.slot.take() {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    pub fn is_used(&self) -> bool {
        self.slot.is_none()
    }
}

/// Create a connected handle/endpoint pair
pub fn stream_pair<M, R>() -> (StreamHandle<M, R>, StreamEndpoint<M, R>) {
    let (sink, inbound) = mpsc::unbounded_channel();
    let (tx, response) = oneshot::channel();

    (
        StreamHandle { sink, response },
        StreamEndpoint {
            inbound,
            responder: Responder { slot: Some(tx) },
        },
    )
}

impl<M, R> StreamEndpoint<M, R> {
    /// Next outbound frame; `None` once the caller half-closed the stream
    pub async fn next_frame(&mut self) -> Option<OutboundFrame<M>> {
        self.inbound.recv().await
    }

    /// Deliver the terminal response (at most once)
    pub fn respond(&mut self, response: Result<R, Status>) -> bool {
        self.responder.respond(response)
    }

    /// Drain outbound frames until half-close or abort.
    ///
    /// Returns the received messages, or the abort status if the caller failed
    /// the stream.
    pub async fn collect_messages(&mut self) -> Result<Vec<M>, Status> {
        let mut messages = Vec::new();
        while let Some(frame) = self.next_frame().await {
            match frame {
                OutboundFrame::Message(m) => messages.push(m),
                OutboundFrame::Abort(status) => return Err(status),
            }
        }
        Ok(messages)
    }

    /// Split into a request stream suitable for a tonic client-streaming call
    /// and the responder.
    ///
    /// The request stream ends at half-close. An abort frame ends it too; the
    /// adapter should then drop the in-flight call instead of responding.
    pub fn into_request_stream(self) -> (impl Stream<Item = M> + Send, Responder<R>)
    where
        M: Send + 'static,
    {
        let frames = UnboundedReceiverStream::new(self.inbound);
        let stream = frames
            .take_while(|frame| matches!(frame, OutboundFrame::Message(_)))
            .filter_map(|frame| match frame {
                OutboundFrame::Message(m) => Some(m),
                OutboundFrame::Abort(_) => None,
            });
        (stream, self.responder)
    }
}

/// Opens the outbound side of a client-streaming call for a target
///
/// Implemented by transport adapters. A tonic-backed implementation starts the
/// RPC with the request stream from [`StreamEndpoint::into_request_stream`] and
/// forwards the unary response to the responder.
#[async_trait]
pub trait StreamOpener<M, R>: Send + Sync {
    async fn open_stream(&self, target: &str) -> Result<StreamHandle<M, R>, Status>;
}
