/*!
 * SkylinkClient: wires configuration, executors and transports together
 */

use std::sync::Arc;

use skylink_connect::{ConnectError, ExecutorRegistry, TargetHealth};
use tracing::info;

use crate::config::{ClientConfig, ServiceConfig};
use crate::error::{Result, SdkError};
use crate::live_data::{LiveData, LiveDataTransport};
use crate::mission::{MissionAutonomy, MissionTransport};
use crate::remote_control::{RemoteControl, RemoteControlTransport};
use crate::service::CallContext;

/// Entry point of the SDK
///
/// Each service gets its own executor, keyed by its service name, so a
/// failing mission backend cannot open the breaker for flight commands.
///
/// # Example
///
/// ```rust,no_run
/// use skylink::{ClientConfig, SkylinkClient};
/// # use std::sync::Arc;
/// # async fn example(
/// #     rc: Arc<dyn skylink::RemoteControlTransport>,
/// #     ma: Arc<dyn skylink::MissionTransport>,
/// #     ld: Arc<dyn skylink::LiveDataTransport>,
/// # ) -> skylink::Result<()> {
/// let client = SkylinkClient::builder(ClientConfig::default())
///     .remote_control(rc)
///     .mission_autonomy(ma)
///     .live_data(ld)
///     .build()
///     .await?;
///
/// let task = client.mission_autonomy().get_task("task-1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SkylinkClient {
    config: ClientConfig,
    registry: ExecutorRegistry,
    remote_control: RemoteControl,
    mission_autonomy: MissionAutonomy,
    live_data: LiveData,
}

impl SkylinkClient {
    pub fn builder(config: ClientConfig) -> SkylinkClientBuilder {
        SkylinkClientBuilder {
            config,
            remote_control: None,
            mission_autonomy: None,
            live_data: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn remote_control(&self) -> &RemoteControl {
        &self.remote_control
    }

    pub fn mission_autonomy(&self) -> &MissionAutonomy {
        &self.mission_autonomy
    }

    pub fn live_data(&self) -> &LiveData {
        &self.live_data
    }

    /// Circuit breaker health of every service
    pub async fn health(&self) -> Vec<TargetHealth> {
        self.registry.list_targets().await
    }

    /// Force-close the breaker of one service
    ///
    /// An unknown service name is a configuration error.
    pub async fn reset_circuit(&self, service_name: &str) -> Result<()> {
        self.registry
            .reset(service_name)
            .await
            .map_err(|e| match e {
                ConnectError::TargetNotFound(name) => {
                    SdkError::Config(format!("unknown service '{}'", name))
                }
                other => other.into(),
            })
    }
}

/// Builder collecting one transport per service
pub struct SkylinkClientBuilder {
    config: ClientConfig,
    remote_control: Option<Arc<dyn RemoteControlTransport>>,
    mission_autonomy: Option<Arc<dyn MissionTransport>>,
    live_data: Option<Arc<dyn LiveDataTransport>>,
}

impl SkylinkClientBuilder {
    pub fn remote_control(mut self, transport: Arc<dyn RemoteControlTransport>) -> Self {
        self.remote_control = Some(transport);
        self
    }

    pub fn mission_autonomy(mut self, transport: Arc<dyn MissionTransport>) -> Self {
        self.mission_autonomy = Some(transport);
        self
    }

    pub fn live_data(mut self, transport: Arc<dyn LiveDataTransport>) -> Self {
        self.live_data = Some(transport);
        self
    }

    /// Validate the configuration and create the service clients
    pub async fn build(self) -> Result<SkylinkClient> {
        self.config.validate()?;

        let remote_control = self
            .remote_control
            .ok_or_else(|| missing_transport(&self.config.remote_control))?;
        let mission_autonomy = self
            .mission_autonomy
            .ok_or_else(|| missing_transport(&self.config.mission_autonomy))?;
        let live_data = self
            .live_data
            .ok_or_else(|| missing_transport(&self.config.live_data))?;

        let settings = &self.config.resilience;
        let registry = ExecutorRegistry::new(settings.breaker_config(), settings.retry_config());

        let mut contexts = Vec::with_capacity(3);
        for service in self.config.services() {
            let executor = registry.executor(&service.service_name).await;
            info!(
                service = %service.service_name,
                endpoint = %service.endpoint(),
                "Service client configured"
            );
            contexts.push(CallContext::new(
                service.service_name.clone(),
                executor,
                settings.request_timeout(),
                settings.stream_completion_timeout(),
            ));
        }

        let [rc_ctx, ma_ctx, ld_ctx]: [CallContext; 3] = contexts
            .try_into()
            .map_err(|_| SdkError::Config("expected exactly three services".to_string()))?;

        Ok(SkylinkClient {
            remote_control: RemoteControl::new(remote_control, rc_ctx),
            mission_autonomy: MissionAutonomy::new(mission_autonomy, ma_ctx),
            live_data: LiveData::new(live_data, ld_ctx),
            registry,
            config: self.config,
        })
    }
}

fn missing_transport(service: &ServiceConfig) -> SdkError {
    SdkError::Config(format!(
        "no transport provided for service '{}'",
        service.service_name
    ))
}
