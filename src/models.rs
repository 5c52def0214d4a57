/*!
 * Request and response models shared by the service clients
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation data stamped on every outbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBase {
    /// Serial number of the addressed dock or asset (None for fleet-wide calls)
    #[serde(default)]
    pub sn: Option<String>,
    /// Transaction id, stable across retries of one call
    pub tid: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestBase {
    pub fn new(sn: impl Into<String>) -> Self {
        Self::with_sn(Some(sn.into()))
    }

    /// Request base for calls not addressed to a single device
    pub fn unscoped() -> Self {
        Self::with_sn(None)
    }

    fn with_sn(sn: Option<String>) -> Self {
        Self {
            sn,
            tid: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A request body paired with its correlation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub base: RequestBase,
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn new(sn: impl Into<String>, body: T) -> Self {
        Self {
            base: RequestBase::new(sn),
            body,
        }
    }

    pub fn unscoped(body: T) -> Self {
        Self {
            base: RequestBase::unscoped(),
            body,
        }
    }

    pub fn tid(&self) -> &str {
        &self.base.tid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub error_code: String,
    pub error_message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Progress of a long-running remote operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Completion in percent (0-100)
    pub progress: f32,
    pub state: String,
    pub left_time_secs: f32,
}

/// Result of a remote control command or a manual control session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub tid: String,
    pub sn: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Flight started by a takeoff command
    #[serde(default)]
    pub flight_id: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub progress: Option<ProgressInfo>,
}

// ---------------------------------------------------------------------------
// Remote control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffRequest {
    pub sn: String,
    pub asset_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Target altitude in meters
    pub altitude: f32,
    #[serde(default)]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoToRequest {
    pub sn: String,
    pub asset_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnToHomeRequest {
    pub sn: String,
    pub asset_id: String,
    /// Return altitude; the asset's configured value when absent
    #[serde(default)]
    pub altitude: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookAtRequest {
    pub sn: String,
    pub asset_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f32,
    /// Keep the camera locked on the point while flying
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualControlRequest {
    pub sn: String,
    pub asset_id: String,
}

/// Dock and asset maintenance operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockOperationRequest {
    pub sn: String,
    pub asset_id: String,
    /// Switch value for toggles (debug mode, AC mode)
    #[serde(default)]
    pub value: Option<bool>,
}

/// One sample of stick input pushed on a manual control stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualControlInput {
    pub base: RequestBase,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub throttle: f32,
    #[serde(default)]
    pub gimbal_pitch: Option<f32>,
}

impl ManualControlInput {
    /// Neutral sticks for `sn`, stamped with a fresh request base
    pub fn new(sn: impl Into<String>) -> Self {
        Self {
            base: RequestBase::new(sn),
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            throttle: 0.0,
            gimbal_pitch: None,
        }
    }

    pub fn with_sticks(mut self, roll: f32, pitch: f32, yaw: f32, throttle: f32) -> Self {
        self.roll = roll;
        self.pitch = pitch;
        self.yaw = yaw;
        self.throttle = throttle;
        self
    }

    pub fn with_gimbal_pitch(mut self, gimbal_pitch: f32) -> Self {
        self.gimbal_pitch = Some(gimbal_pitch);
        self
    }
}

// ---------------------------------------------------------------------------
// Mission autonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub asset_sn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionData {
    pub mission_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub asset_sn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionResponse {
    pub success: bool,
    pub tid: String,
    pub mission_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub mission: Option<MissionData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub asset_sn: String,
    #[serde(default)]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub flight_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    pub task_id: String,
    pub name: String,
    pub asset_sn: String,
    #[serde(default)]
    pub mission_id: Option<String>,
    #[serde(default)]
    pub flight_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,
    pub tid: String,
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub progress: Option<ProgressInfo>,
    #[serde(default)]
    pub task: Option<TaskData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerDefinition {
    pub name: String,
    pub mission_id: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Cron expression for recurring runs
    #[serde(default)]
    pub cron: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerData {
    pub scheduler_id: String,
    pub name: String,
    pub mission_id: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerResponse {
    pub success: bool,
    pub tid: String,
    pub scheduler_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub scheduler: Option<SchedulerData>,
}

// ---------------------------------------------------------------------------
// Live data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiveStreamType {
    #[default]
    Rtmp,
    Rtsp,
    Webrtc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartLiveStreamRequest {
    pub sn: String,
    pub asset_id: String,
    pub video_id: String,
    pub stream_server: String,
    #[serde(default)]
    pub stream_type: LiveStreamType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLiveStreamRequest {
    pub sn: String,
    pub asset_id: String,
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLensRequest {
    pub sn: String,
    pub asset_id: String,
    pub video_id: String,
    /// Lens name (e.g., "wide", "zoom", "ir")
    pub lens: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeZoomRequest {
    pub sn: String,
    pub asset_id: String,
    pub video_id: String,
    pub lens: String,
    pub zoom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LiveDataResponse {
    pub tid: String,
    pub sn: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub has_errors: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Playback URL returned when a live stream starts
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTelemetryRequest {
    pub sn: String,
    #[serde(default)]
    pub asset_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssetTelemetry {
    pub latitude: f64,
    pub longitude: f64,
    pub absolute_altitude: f32,
    pub relative_altitude: f32,
    pub heading: f32,
    #[serde(default)]
    pub battery_percent: Option<u8>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// One telemetry sample pushed by the live data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub tid: String,
    pub timestamp: DateTime<Utc>,
    pub sn: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub has_errors: bool,
    #[serde(default)]
    pub asset: Option<AssetTelemetry>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}
