//! ExecutorRegistry: one resilient executor per remote target

use crate::error::{CallError, ConnectError};
use skylink_core_resilience::{
    BreakerStats, CircuitBreakerConfig, CircuitState, ResilientExecutor, RetryConfig,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Health of a target as seen by its circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Breaker closed, no recent failures
    Healthy,
    /// Breaker closed, but consecutive failures are accumulating
    Degraded { consecutive_failures: u32 },
    /// Breaker open, calls are being rejected
    Open,
}

/// Snapshot of one registered target
#[derive(Debug, Clone)]
pub struct TargetHealth {
    /// Target key (service name or asset serial number)
    pub key: String,
    pub status: TargetStatus,
    pub stats: BreakerStats,
}

/// Registry of per-target executors
///
/// Every call to the same target key goes through the same executor, so the
/// breaker aggregates the health signal across all of them. Executors are
/// created lazily on first use with the registry's default configuration.
///
/// # Example
///
/// ```rust
/// use skylink_connect::ExecutorRegistry;
/// use std::time::Duration;
///
/// # async fn example() {
/// let registry = ExecutorRegistry::default();
/// let executor = registry.executor("remote-control").await;
///
/// let result = executor
///     .execute(|| async { Ok::<_, tonic::Status>("ok") }, Duration::from_secs(5))
///     .await;
/// assert!(result.is_ok());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutorRegistry {
    breaker_config: CircuitBreakerConfig,
    retry_config: RetryConfig,

    /// Active executors (key -> executor)
    executors: Arc<RwLock<HashMap<String, ResilientExecutor>>>,
}

impl ExecutorRegistry {
    /// Create an empty registry with the given defaults for new targets
    pub fn new(breaker_config: CircuitBreakerConfig, retry_config: RetryConfig) -> Self {
        Self {
            breaker_config,
            retry_config,
            executors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a target with its own configuration, replacing any existing one
    pub async fn register(
        &self,
        key: impl Into<String>,
        breaker_config: CircuitBreakerConfig,
        retry_config: RetryConfig,
    ) -> ResilientExecutor {
        let key = key.into();
        info!("Registering target: {}", key);

        let executor = ResilientExecutor::new(breaker_config, retry_config);
        let mut executors = self.executors.write().await;
        executors.insert(key, executor.clone());
        executor
    }

    /// Get the executor for `key`, creating it on first use
    pub async fn executor(&self, key: &str) -> ResilientExecutor {
        {
            let executors = self.executors.read().await;
            if let Some(executor) = executors.get(key) {
                return executor.clone();
            }
        }

        let mut executors = self.executors.write().await;
        executors
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!("Creating executor for target: {}", key);
                ResilientExecutor::new(self.breaker_config.clone(), self.retry_config.clone())
            })
            .clone()
    }

    /// Run a unary call against `key` through its executor
    pub async fn call<F, Fut, T>(
        &self,
        key: &str,
        factory: F,
        timeout: Duration,
    ) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, tonic::Status>>,
    {
        self.executor(key).await.execute(factory, timeout).await
    }

    /// Remove a target and drop its breaker state
    pub async fn remove(&self, key: &str) -> Result<(), ConnectError> {
        info!("Removing target: {}", key);

        let mut executors = self.executors.write().await;
        executors
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ConnectError::TargetNotFound(key.to_string()))
    }

    /// Health snapshot of one target
    pub async fn health(&self, key: &str) -> Result<TargetHealth, ConnectError> {
        let executors = self.executors.read().await;
        executors
            .get(key)
            .map(|executor| Self::snapshot(key, executor))
            .ok_or_else(|| ConnectError::TargetNotFound(key.to_string()))
    }

    /// Health snapshot of every target
    pub async fn list_targets(&self) -> Vec<TargetHealth> {
        let executors = self.executors.read().await;
        let mut targets: Vec<_> = executors
            .iter()
            .map(|(key, executor)| Self::snapshot(key, executor))
            .collect();
        targets.sort_by(|a, b| a.key.cmp(&b.key));
        targets
    }

    /// Close the breaker of one target
    pub async fn reset(&self, key: &str) -> Result<(), ConnectError> {
        let executors = self.executors.read().await;
        let executor = executors
            .get(key)
            .ok_or_else(|| ConnectError::TargetNotFound(key.to_string()))?;
        executor.breaker().reset();
        info!("Reset circuit breaker for target: {}", key);
        Ok(())
    }

    /// Close every breaker
    pub async fn reset_all(&self) {
        info!("Resetting all circuit breakers");

        let executors = self.executors.read().await;
        for executor in executors.values() {
            executor.breaker().reset();
        }
    }

    fn snapshot(key: &str, executor: &ResilientExecutor) -> TargetHealth {
        let breaker = executor.breaker();
        let status = match breaker.state() {
            CircuitState::Open { .. } => TargetStatus::Open,
            CircuitState::Closed => match breaker.failure_count() {
                0 => TargetStatus::Healthy,
                n => TargetStatus::Degraded {
                    consecutive_failures: n,
                },
            },
        };

        TargetHealth {
            key: key.to_string(),
            status,
            stats: breaker.stats(),
        }
    }
}
