/*!
 * Remote control client: flight, manual control, dock and asset commands
 */

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skylink_connect::{StreamHandle, StreamingSession};
use tonic::Status;
use tracing::info;

use crate::error::Result;
use crate::models::{
    CommandResponse, DockOperationRequest, Envelope, GoToRequest, LookAtRequest,
    ManualControlInput, ManualControlRequest, ReturnToHomeRequest, TakeoffRequest,
};
use crate::service::CallContext;

/// A unary remote control command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RemoteCommand {
    Takeoff(TakeoffRequest),
    GoTo(GoToRequest),
    ReturnToHome(ReturnToHomeRequest),
    LookAt(LookAtRequest),
    EnterManualControl(ManualControlRequest),
    ExitManualControl(ManualControlRequest),
    OpenCover(DockOperationRequest),
    CloseCover(DockOperationRequest),
    StartCharging(DockOperationRequest),
    StopCharging(DockOperationRequest),
    RebootAsset(DockOperationRequest),
    BootSubAsset(DockOperationRequest),
    DebugMode(DockOperationRequest),
    ChangeAcMode(DockOperationRequest),
}

impl RemoteCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCommand::Takeoff(_) => "takeoff",
            RemoteCommand::GoTo(_) => "go_to",
            RemoteCommand::ReturnToHome(_) => "return_to_home",
            RemoteCommand::LookAt(_) => "look_at",
            RemoteCommand::EnterManualControl(_) => "enter_manual_control",
            RemoteCommand::ExitManualControl(_) => "exit_manual_control",
            RemoteCommand::OpenCover(_) => "open_cover",
            RemoteCommand::CloseCover(_) => "close_cover",
            RemoteCommand::StartCharging(_) => "start_charging",
            RemoteCommand::StopCharging(_) => "stop_charging",
            RemoteCommand::RebootAsset(_) => "reboot_asset",
            RemoteCommand::BootSubAsset(_) => "boot_sub_asset",
            RemoteCommand::DebugMode(_) => "debug_mode",
            RemoteCommand::ChangeAcMode(_) => "change_ac_mode",
        }
    }

    /// Serial number of the dock or asset the command addresses
    pub fn sn(&self) -> &str {
        match self {
            RemoteCommand::Takeoff(r) => &r.sn,
            RemoteCommand::GoTo(r) => &r.sn,
            RemoteCommand::ReturnToHome(r) => &r.sn,
            RemoteCommand::LookAt(r) => &r.sn,
            RemoteCommand::EnterManualControl(r) | RemoteCommand::ExitManualControl(r) => &r.sn,
            RemoteCommand::OpenCover(r)
            | RemoteCommand::CloseCover(r)
            | RemoteCommand::StartCharging(r)
            | RemoteCommand::StopCharging(r)
            | RemoteCommand::RebootAsset(r)
            | RemoteCommand::BootSubAsset(r)
            | RemoteCommand::DebugMode(r)
            | RemoteCommand::ChangeAcMode(r) => &r.sn,
        }
    }
}

/// Transport to the remote control service
#[async_trait]
pub trait RemoteControlTransport: Send + Sync {
    async fn send_command(
        &self,
        request: Envelope<RemoteCommand>,
    ) -> std::result::Result<CommandResponse, Status>;

    /// Open a client stream of stick inputs to one asset
    async fn open_manual_control(
        &self,
        sn: &str,
        asset_id: &str,
    ) -> std::result::Result<StreamHandle<ManualControlInput, CommandResponse>, Status>;
}

/// Remote control service client
#[derive(Clone)]
pub struct RemoteControl {
    transport: Arc<dyn RemoteControlTransport>,
    ctx: CallContext,
}

impl RemoteControl {
    pub fn new(transport: Arc<dyn RemoteControlTransport>, ctx: CallContext) -> Self {
        Self { transport, ctx }
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    /// Send any command through the executor
    pub async fn send(&self, command: RemoteCommand) -> Result<CommandResponse> {
        let name = command.name();
        let sn = command.sn().to_string();
        let request = Envelope::new(sn, command);
        let transport = &self.transport;
        self.ctx
            .unary(name, request, |req| transport.send_command(req))
            .await
    }

    // Flight ops

    /// Take off; the response carries the new flight id
    pub async fn takeoff(&self, request: TakeoffRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::Takeoff(request)).await
    }

    pub async fn go_to(&self, request: GoToRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::GoTo(request)).await
    }

    pub async fn return_to_home(&self, request: ReturnToHomeRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::ReturnToHome(request)).await
    }

    pub async fn look_at(&self, request: LookAtRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::LookAt(request)).await
    }

    // Manual control

    pub async fn enter_manual_control(
        &self,
        request: ManualControlRequest,
    ) -> Result<CommandResponse> {
        self.send(RemoteCommand::EnterManualControl(request)).await
    }

    pub async fn exit_manual_control(
        &self,
        request: ManualControlRequest,
    ) -> Result<CommandResponse> {
        self.send(RemoteCommand::ExitManualControl(request)).await
    }

    /// Open a manual control input stream to `asset_id` on dock `sn`
    ///
    /// Opening goes through the executor (breaker, retry, request timeout).
    /// The returned session is keyed by `sn` and half-closes on drop.
    pub async fn start_manual_control_input(
        &self,
        sn: &str,
        asset_id: &str,
    ) -> Result<StreamingSession<ManualControlInput, CommandResponse>> {
        let transport = &self.transport;
        let handle = self
            .ctx
            .run("open_manual_control", || {
                transport.open_manual_control(sn, asset_id)
            })
            .await?;

        info!(sn, asset_id, "Manual control input stream opened");
        Ok(StreamingSession::from_handle(
            sn,
            handle,
            self.ctx.completion_timeout(),
        ))
    }

    // Dock ops

    pub async fn open_cover(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::OpenCover(request)).await
    }

    pub async fn close_cover(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::CloseCover(request)).await
    }

    pub async fn start_charging(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::StartCharging(request)).await
    }

    pub async fn stop_charging(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::StopCharging(request)).await
    }

    // Asset ops

    pub async fn reboot_asset(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::RebootAsset(request)).await
    }

    pub async fn boot_sub_asset(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::BootSubAsset(request)).await
    }

    /// Toggle debug mode (`value` switches it on or off)
    pub async fn debug_mode(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::DebugMode(request)).await
    }

    pub async fn change_ac_mode(&self, request: DockOperationRequest) -> Result<CommandResponse> {
        self.send(RemoteCommand::ChangeAcMode(request)).await
    }
}

impl std::fmt::Debug for RemoteControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteControl")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
