//! Completion-versus-timeout race
//!
//! Exactly one side of the race resolves the call. The losing side is dropped
//! in place: a timed-out operation future is cancelled, and a completed
//! operation cancels its timer.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The operation did not complete within its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} elapsed")]
pub struct TimedOut(pub Duration);

/// Race `operation` against a timer of `limit`.
///
/// When both are ready in the same poll, the operation wins.
pub async fn race_timeout<F>(operation: F, limit: Duration) -> Result<F::Output, TimedOut>
where
    F: Future,
{
    let timer = tokio::time::sleep(limit);
    tokio::pin!(operation);
    tokio::pin!(timer);

    tokio::select! {
        biased;
        output = &mut operation => Ok(output),
        () = &mut timer => Err(TimedOut(limit)),
    }
}
