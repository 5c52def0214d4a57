/*!
 * Call plumbing shared by the service clients
 */

use std::future::Future;
use std::time::Duration;

use skylink_core_resilience::ResilientExecutor;
use tonic::Status;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::Envelope;

/// Executor and timeouts one service client runs its calls with
#[derive(Debug, Clone)]
pub struct CallContext {
    service: String,
    executor: ResilientExecutor,
    request_timeout: Duration,
    completion_timeout: Duration,
}

impl CallContext {
    pub fn new(
        service: impl Into<String>,
        executor: ResilientExecutor,
        request_timeout: Duration,
        completion_timeout: Duration,
    ) -> Self {
        Self {
            service: service.into(),
            executor,
            request_timeout,
            completion_timeout,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.executor
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Bound on the terminal response wait of streaming sessions
    pub fn completion_timeout(&self) -> Duration {
        self.completion_timeout
    }

    /// Run one unary request through the executor
    ///
    /// Every attempt sends a clone of the same envelope, so retries share the
    /// original transaction id.
    pub(crate) async fn unary<Req, Resp, F, Fut>(
        &self,
        operation: &'static str,
        request: Envelope<Req>,
        mut send: F,
    ) -> Result<Resp>
    where
        Req: Clone,
        F: FnMut(Envelope<Req>) -> Fut,
        Fut: Future<Output = std::result::Result<Resp, Status>>,
    {
        debug!(
            service = %self.service,
            operation,
            tid = %request.tid(),
            "Dispatching request"
        );

        self.run(operation, || send(request.clone())).await
    }

    /// Run a factory that takes no request (stream opening)
    pub(crate) async fn run<F, Fut, T>(&self, operation: &'static str, factory: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, Status>>,
    {
        match self.executor.execute(factory, self.request_timeout).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(service = %self.service, operation, "Request failed: {}", e);
                Err(e.into())
            }
        }
    }
}
