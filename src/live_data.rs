/*!
 * Live data client: video streams, camera control and telemetry
 */

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tonic::Status;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{
    ChangeLensRequest, ChangeZoomRequest, Envelope, LiveDataResponse, StartLiveStreamRequest,
    StopLiveStreamRequest, StreamTelemetryRequest, TelemetryFrame,
};
use crate::service::CallContext;

/// Telemetry frames as delivered by the server
///
/// The stream ends after the server closes it or after the first error item.
pub type TelemetryStream = BoxStream<'static, std::result::Result<TelemetryFrame, Status>>;

/// Transport to the live data service
#[async_trait]
pub trait LiveDataTransport: Send + Sync {
    async fn start_live_stream(
        &self,
        request: Envelope<StartLiveStreamRequest>,
    ) -> std::result::Result<LiveDataResponse, Status>;

    async fn stop_live_stream(
        &self,
        request: Envelope<StopLiveStreamRequest>,
    ) -> std::result::Result<LiveDataResponse, Status>;

    async fn change_lens(
        &self,
        request: Envelope<ChangeLensRequest>,
    ) -> std::result::Result<LiveDataResponse, Status>;

    async fn change_zoom(
        &self,
        request: Envelope<ChangeZoomRequest>,
    ) -> std::result::Result<LiveDataResponse, Status>;

    /// Open a server stream of telemetry frames
    async fn stream_telemetry(
        &self,
        request: Envelope<StreamTelemetryRequest>,
    ) -> std::result::Result<TelemetryStream, Status>;
}

/// Live data service client
#[derive(Clone)]
pub struct LiveData {
    transport: Arc<dyn LiveDataTransport>,
    ctx: CallContext,
}

impl LiveData {
    pub fn new(transport: Arc<dyn LiveDataTransport>, ctx: CallContext) -> Self {
        Self { transport, ctx }
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    pub async fn start_live_stream(
        &self,
        request: StartLiveStreamRequest,
    ) -> Result<LiveDataResponse> {
        let transport = &self.transport;
        let request = Envelope::new(request.sn.clone(), request);
        self.ctx
            .unary("start_live_stream", request, |req| {
                transport.start_live_stream(req)
            })
            .await
    }

    pub async fn stop_live_stream(&self, request: StopLiveStreamRequest) -> Result<LiveDataResponse> {
        let transport = &self.transport;
        let request = Envelope::new(request.sn.clone(), request);
        self.ctx
            .unary("stop_live_stream", request, |req| {
                transport.stop_live_stream(req)
            })
            .await
    }

    pub async fn change_camera_lens(&self, request: ChangeLensRequest) -> Result<LiveDataResponse> {
        let transport = &self.transport;
        let request = Envelope::new(request.sn.clone(), request);
        self.ctx
            .unary("change_camera_lens", request, |req| transport.change_lens(req))
            .await
    }

    pub async fn change_camera_zoom(&self, request: ChangeZoomRequest) -> Result<LiveDataResponse> {
        let transport = &self.transport;
        let request = Envelope::new(request.sn.clone(), request);
        self.ctx
            .unary("change_camera_zoom", request, |req| transport.change_zoom(req))
            .await
    }

    /// Subscribe to telemetry of `request.sn`
    ///
    /// Opening the stream runs through the executor. Frames are not retried:
    /// once the server reports an error the stream yields it and ends, and the
    /// caller decides whether to subscribe again.
    pub async fn stream_telemetry(&self, request: StreamTelemetryRequest) -> Result<TelemetryStream> {
        let transport = &self.transport;
        let sn = request.sn.clone();
        let request = Envelope::new(sn.clone(), request);
        let tid = request.tid().to_string();

        let inner = self
            .ctx
            .run("stream_telemetry", || {
                transport.stream_telemetry(request.clone())
            })
            .await?;
        debug!(sn = %sn, tid = %tid, "Telemetry stream opened");

        Ok(fuse_on_error(inner, sn))
    }
}

/// End the stream right after its first error item
fn fuse_on_error(inner: TelemetryStream, sn: String) -> TelemetryStream {
    stream::unfold(Some(inner), move |state| {
        let sn = sn.clone();
        async move {
            let mut inner = state?;
            match inner.next().await {
                Some(Ok(frame)) => Some((Ok(frame), Some(inner))),
                Some(Err(status)) => {
                    warn!(sn = %sn, code = ?status.code(), "Telemetry stream failed: {}", status.message());
                    Some((Err(status), None))
                }
                None => {
                    debug!(sn = %sn, "Telemetry stream ended by server");
                    None
                }
            }
        }
    })
    .boxed()
}

impl std::fmt::Debug for LiveData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveData")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skylink_core_resilience::{CircuitBreakerConfig, ResilientExecutor, RetryConfig};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Serves three frames, then an error, then one more frame that must never be seen
    #[derive(Default)]
    struct FlakyTelemetry {
        opens: AtomicU32,
        refuse_first: bool,
    }

    fn frame(sn: &str, n: usize) -> TelemetryFrame {
        TelemetryFrame {
            tid: format!("frame-{}", n),
            timestamp: Utc::now(),
            sn: sn.to_string(),
            asset_id: None,
            has_errors: false,
            asset: None,
            error: None,
        }
    }

    #[async_trait]
    impl LiveDataTransport for FlakyTelemetry {
        async fn start_live_stream(
            &self,
            request: Envelope<StartLiveStreamRequest>,
        ) -> std::result::Result<LiveDataResponse, Status> {
            Ok(LiveDataResponse {
                tid: request.base.tid,
                sn: request.body.sn,
                stream_url: Some(format!("{}/{}", request.body.stream_server, request.body.video_id)),
                ..Default::default()
            })
        }

        async fn stop_live_stream(
            &self,
            _request: Envelope<StopLiveStreamRequest>,
        ) -> std::result::Result<LiveDataResponse, Status> {
            Err(Status::failed_precondition("no stream running"))
        }

        async fn change_lens(
            &self,
            request: Envelope<ChangeLensRequest>,
        ) -> std::result::Result<LiveDataResponse, Status> {
            Ok(LiveDataResponse {
                tid: request.base.tid,
                sn: request.body.sn,
                ..Default::default()
            })
        }

        async fn change_zoom(
            &self,
            request: Envelope<ChangeZoomRequest>,
        ) -> std::result::Result<LiveDataResponse, Status> {
            Ok(LiveDataResponse {
                tid: request.base.tid,
                sn: request.body.sn,
                message: Some(format!("zoom {}", request.body.zoom)),
                ..Default::default()
            })
        }

        async fn stream_telemetry(
            &self,
            request: Envelope<StreamTelemetryRequest>,
        ) -> std::result::Result<TelemetryStream, Status> {
            let opened = self.opens.fetch_add(1, Ordering::SeqCst);
            if self.refuse_first && opened == 0 {
                return Err(Status::unavailable("warming up"));
            }

            let sn = request.body.sn;
            let items = vec![
                Ok(frame(&sn, 1)),
                Ok(frame(&sn, 2)),
                Ok(frame(&sn, 3)),
                Err(Status::data_loss("uplink dropped")),
                Ok(frame(&sn, 4)),
            ];
            Ok(stream::iter(items).boxed())
        }
    }

    fn client(transport: FlakyTelemetry) -> LiveData {
        let executor = ResilientExecutor::new(
            CircuitBreakerConfig::default(),
            RetryConfig {
                max_attempts: 2,
                base_delay: Duration::from_millis(200),
            },
        );
        LiveData::new(
            Arc::new(transport),
            CallContext::new(
                "live-data",
                executor,
                Duration::from_secs(60),
                Duration::from_secs(30),
            ),
        )
    }

    fn telemetry_request() -> StreamTelemetryRequest {
        StreamTelemetryRequest {
            sn: "dock-5".to_string(),
            asset_id: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_telemetry_stops_after_error() {
        let ld = client(FlakyTelemetry {
            refuse_first: true,
            ..Default::default()
        });

        let items: Vec<_> = ld
            .stream_telemetry(telemetry_request())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 4);
        assert!(items[..3].iter().all(|i| i.is_ok()));
        assert_eq!(
            items[3].as_ref().unwrap_err().code(),
            tonic::Code::DataLoss
        );
    }

    #[tokio::test]
    async fn test_start_live_stream_returns_url() {
        let ld = client(FlakyTelemetry::default());
        let response = ld
            .start_live_stream(StartLiveStreamRequest {
                sn: "dock-5".to_string(),
                asset_id: "drone-5".to_string(),
                video_id: "cam-0".to_string(),
                stream_server: "rtmp://media.local/live".to_string(),
                stream_type: Default::default(),
            })
            .await
            .unwrap();

        assert_eq!(
            response.stream_url.as_deref(),
            Some("rtmp://media.local/live/cam-0")
        );
    }

    #[tokio::test]
    async fn test_stop_without_stream_is_rejected() {
        let ld = client(FlakyTelemetry::default());
        let err = ld
            .stop_live_stream(StopLiveStreamRequest {
                sn: "dock-5".to_string(),
                asset_id: "drone-5".to_string(),
                video_id: "cam-0".to_string(),
            })
            .await
            .unwrap_err();

        assert!(!err.is_circuit_open());
        assert_eq!(
            err.status().map(|s| s.code()),
            Some(tonic::Code::FailedPrecondition)
        );
    }
}
