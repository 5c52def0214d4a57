//! Integration tests for skylink-connect
//!
//! These tests drive sessions and the executor registry against an in-memory
//! opener that plays the remote side of a client-streaming call.

use async_trait::async_trait;
use skylink_connect::{
    stream_pair, ConnectError, ExecutorRegistry, SessionState, StreamHandle, StreamOpener,
    StreamingSession, TargetStatus,
};
use skylink_core_resilience::{CircuitBreakerConfig, RetryConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::Status;

/// Remote side that sums the received values and answers on half-close
struct SummingRemote {
    opened: AtomicU32,
    refuse: bool,
}

impl SummingRemote {
    fn new(refuse: bool) -> Self {
        Self {
            opened: AtomicU32::new(0),
            refuse,
        }
    }
}

#[async_trait]
impl StreamOpener<u32, u64> for SummingRemote {
    async fn open_stream(&self, target: &str) -> Result<StreamHandle<u32, u64>, Status> {
        if self.refuse {
            return Err(Status::unavailable(format!("{} unreachable", target)));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);

        let (handle, mut endpoint) = stream_pair();
        tokio::spawn(async move {
            match endpoint.collect_messages().await {
                Ok(values) => {
                    endpoint.respond(Ok(values.iter().map(|v| *v as u64).sum()));
                }
                Err(_aborted) => {}
            }
        });
        Ok(handle)
    }
}

#[tokio::test]
async fn test_session_round_trip_through_opener() {
    let remote = SummingRemote::new(false);

    let mut session = StreamingSession::open("asset-1", &remote, Duration::from_secs(5))
        .await
        .unwrap();
    for v in 1..=10 {
        session.send(v).unwrap();
    }

    assert_eq!(session.complete().await.unwrap(), 55);
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(remote.opened.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_open_failure_surfaces_status() {
    let remote = SummingRemote::new(true);

    let err = StreamingSession::<u32, u64>::open("asset-2", &remote, Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        ConnectError::Status(status) => assert_eq!(status.code(), tonic::Code::Unavailable),
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_session_gets_no_response() {
    let remote = SummingRemote::new(false);

    let mut session = StreamingSession::open("asset-3", &remote, Duration::from_secs(5))
        .await
        .unwrap();
    session.send(7).unwrap();
    session.fail(Status::cancelled("pilot released sticks")).unwrap();

    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.complete().await.unwrap_err().is_usage());
}

#[tokio::test(start_paused = true)]
async fn test_registry_aggregates_failures_across_calls() {
    let registry = ExecutorRegistry::new(
        CircuitBreakerConfig {
            failure_threshold: 3,
            open_duration: Duration::from_secs(30),
        },
        RetryConfig {
            max_attempts: 0,
            base_delay: Duration::from_millis(100),
        },
    );
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..3 {
        let calls = calls.clone();
        let result: Result<(), _> = registry
            .call(
                "live-data",
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(Status::unavailable("restarting")) }
                },
                Duration::from_secs(1),
            )
            .await;
        assert!(result.unwrap_err().is_exhausted());
    }

    let health = registry.health("live-data").await.unwrap();
    assert_eq!(health.status, TargetStatus::Open);

    let rejected: Result<(), _> = registry
        .call(
            "live-data",
            || async { Ok(()) },
            Duration::from_secs(1),
        )
        .await;
    assert!(rejected.unwrap_err().is_circuit_open());
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    tokio::time::advance(Duration::from_secs(31)).await;
    let recovered: Result<u8, _> = registry
        .call("live-data", || async { Ok(1) }, Duration::from_secs(1))
        .await;
    assert_eq!(recovered.unwrap(), 1);
    assert_eq!(
        registry.health("live-data").await.unwrap().status,
        TargetStatus::Healthy
    );
}

#[tokio::test]
async fn test_registry_lists_targets_sorted() {
    let registry = ExecutorRegistry::default();
    registry.executor("remote-control").await;
    registry.executor("live-data").await;
    registry.executor("mission-autonomy").await;

    let keys: Vec<String> = registry
        .list_targets()
        .await
        .into_iter()
        .map(|t| t.key)
        .collect();
    assert_eq!(keys, vec!["live-data", "mission-autonomy", "remote-control"]);

    registry.remove("live-data").await.unwrap();
    assert_eq!(registry.list_targets().await.len(), 2);
}
