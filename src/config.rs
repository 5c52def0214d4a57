/*!
 * Configuration types for Skylink
 */

use serde::{Deserialize, Serialize};
use skylink_core_resilience::{CircuitBreakerConfig, RetryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, SdkError};

/// Service name of the remote control target
pub const REMOTE_CONTROL: &str = "remote-control";
/// Service name of the mission autonomy target
pub const MISSION_AUTONOMY: &str = "mission-autonomy";
/// Service name of the live data target
pub const LIVE_DATA: &str = "live-data";

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Remote control service (flight, dock and asset commands)
    #[serde(default = "default_remote_control")]
    pub remote_control: ServiceConfig,

    /// Mission autonomy service (missions, tasks, schedulers)
    #[serde(default = "default_mission_autonomy")]
    pub mission_autonomy: ServiceConfig,

    /// Live data service (telemetry and video streams)
    #[serde(default = "default_live_data")]
    pub live_data: ServiceConfig,

    /// Retry, circuit breaker and timeout settings shared by all services
    #[serde(default)]
    pub resilience: ResilienceSettings,

    /// Diagnostic logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_control: default_remote_control(),
            mission_autonomy: default_mission_autonomy(),
            live_data: default_live_data(),
            resilience: ResilienceSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Connection settings for one remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Logical service name, also the circuit breaker target key
    pub service_name: String,

    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    /// Connect without TLS
    #[serde(default = "default_true")]
    pub use_plaintext: bool,

    /// Load-balancing policy handed to the transport
    #[serde(default)]
    pub load_balancer: LoadBalancerType,
}

impl ServiceConfig {
    pub fn new(service_name: &str, port: u16) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: default_host(),
            port,
            use_plaintext: true,
            load_balancer: LoadBalancerType::default(),
        }
    }

    /// Endpoint URI for the transport (e.g., "http://localhost:9091")
    pub fn endpoint(&self) -> String {
        let scheme = if self.use_plaintext { "http" } else { "https" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(SdkError::Config("service_name must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(SdkError::Config(format!(
                "host for service '{}' must not be empty",
                self.service_name
            )));
        }
        if self.port == 0 {
            return Err(SdkError::Config(format!(
                "port for service '{}' must not be 0",
                self.service_name
            )));
        }
        Ok(())
    }
}

/// Load balancer policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerType {
    #[default]
    RoundRobin,
    Random,
    LeastRequests,
    PowerOfTwoChoices,
}

/// Retry, circuit breaker and timeout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResilienceSettings {
    /// Retries after the first attempt
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Base retry delay in milliseconds (retry N waits N times this)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Consecutive failures that open the circuit (at least 1)
    #[serde(default = "default_failure_threshold")]
    pub circuit_breaker_failure_threshold: u32,

    /// How long an open circuit rejects calls, in milliseconds
    #[serde(default = "default_circuit_wait_ms")]
    pub circuit_breaker_wait_ms: u64,

    /// Transport connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Per-attempt timeout for unary calls in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bound on the terminal response wait of a streaming session, in seconds
    #[serde(default = "default_stream_completion_timeout")]
    pub stream_completion_timeout_secs: u64,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            circuit_breaker_failure_threshold: default_failure_threshold(),
            circuit_breaker_wait_ms: default_circuit_wait_ms(),
            connection_timeout_secs: default_connection_timeout(),
            request_timeout_secs: default_request_timeout(),
            stream_completion_timeout_secs: default_stream_completion_timeout(),
        }
    }
}

impl ResilienceSettings {
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker_failure_threshold,
            open_duration: Duration::from_millis(self.circuit_breaker_wait_ms),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            base_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn stream_completion_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_completion_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.circuit_breaker_failure_threshold < 1 {
            return Err(SdkError::Config(
                "circuit_breaker_failure_threshold must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("connection_timeout_secs", self.connection_timeout_secs),
            (
                "stream_completion_timeout_secs",
                self.stream_completion_timeout_secs,
            ),
        ] {
            if value == 0 {
                return Err(SdkError::Config(format!("{} must be greater than 0", name)));
            }
        }
        Ok(())
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of compact text on stdout
    #[serde(default)]
    pub json: bool,
}

fn default_remote_control() -> ServiceConfig {
    ServiceConfig::new(REMOTE_CONTROL, 9091)
}

fn default_mission_autonomy() -> ServiceConfig {
    ServiceConfig::new(MISSION_AUTONOMY, 9092)
}

fn default_live_data() -> ServiceConfig {
    ServiceConfig::new(LIVE_DATA, 9093)
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_circuit_wait_ms() -> u64 {
    30_000
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_stream_completion_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded client configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SdkError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check every setting against its allowed range
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for service in self.services() {
            service.validate()?;
            if !names.insert(service.service_name.as_str()) {
                return Err(SdkError::Config(format!(
                    "service_name '{}' is used by more than one service",
                    service.service_name
                )));
            }
        }
        self.resilience.validate()
    }

    /// All service configurations
    pub fn services(&self) -> [&ServiceConfig; 3] {
        [&self.remote_control, &self.mission_autonomy, &self.live_data]
    }

    /// Apply `SKYLINK_<SERVICE>_HOST` / `SKYLINK_<SERVICE>_PORT` from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in [
            &mut self.remote_control,
            &mut self.mission_autonomy,
            &mut self.live_data,
        ] {
            let prefix = format!(
                "SKYLINK_{}",
                service.service_name.to_uppercase().replace('-', "_")
            );

            if let Some(host) = lookup(&format!("{}_HOST", prefix)) {
                service.host = host;
            }
            if let Some(port) = lookup(&format!("{}_PORT", prefix)) {
                service.port = port.parse().map_err(|_| {
                    SdkError::Config(format!("{}_PORT is not a valid port: '{}'", prefix, port))
                })?;
            }
            if let Some(plaintext) = lookup(&format!("{}_PLAINTEXT", prefix)) {
                match plaintext.parse() {
                    Ok(value) => service.use_plaintext = value,
                    Err(_) => warn!(
                        "Ignoring {}_PLAINTEXT='{}': expected true or false",
                        prefix, plaintext
                    ),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.remote_control.port, 9091);
        assert_eq!(config.mission_autonomy.port, 9092);
        assert_eq!(config.live_data.port, 9093);
        assert_eq!(config.resilience.max_retry_attempts, 3);
        assert_eq!(config.resilience.retry_delay_ms, 1000);
        assert_eq!(config.resilience.circuit_breaker_failure_threshold, 5);
        assert_eq!(config.resilience.circuit_breaker_wait_ms, 30_000);
        assert_eq!(config.resilience.request_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint() {
        let mut service = ServiceConfig::new("remote-control", 9091);
        assert_eq!(service.endpoint(), "http://localhost:9091");

        service.use_plaintext = false;
        service.host = "rc.fleet.internal".to_string();
        assert_eq!(service.endpoint(), "https://rc.fleet.internal:9091");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[remote_control]
service_name = "remote-control"
host = "10.0.0.5"
port = 7001
load_balancer = "least_requests"

[resilience]
max_retry_attempts = 2
retry_delay_ms = 250
"#;

        let config = ClientConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.remote_control.host, "10.0.0.5");
        assert_eq!(config.remote_control.port, 7001);
        assert_eq!(
            config.remote_control.load_balancer,
            LoadBalancerType::LeastRequests
        );
        assert_eq!(config.live_data.port, 9093);
        assert_eq!(config.resilience.max_retry_attempts, 2);
        assert_eq!(
            config.resilience.retry_config().base_delay,
            Duration::from_millis(250)
        );
        assert_eq!(config.resilience.circuit_breaker_failure_threshold, 5);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClientConfig::from_toml_str("resilience = 3").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn test_validation_rejects_zero_threshold() {
        let mut config = ClientConfig::default();
        config.resilience.circuit_breaker_failure_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.resilience.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_validation_rejects_duplicate_service_names() {
        let mut config = ClientConfig::default();
        config.live_data.service_name = REMOTE_CONTROL.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retries_and_delay_are_valid() {
        let mut config = ClientConfig::default();
        config.resilience.max_retry_attempts = 0;
        config.resilience.retry_delay_ms = 0;
        config.resilience.circuit_breaker_wait_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SKYLINK_LIVE_DATA_HOST", "telemetry.local"),
            ("SKYLINK_LIVE_DATA_PORT", "9500"),
            ("SKYLINK_REMOTE_CONTROL_PLAINTEXT", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.live_data.host, "telemetry.local");
        assert_eq!(config.live_data.port, 9500);
        assert!(!config.remote_control.use_plaintext);
        assert_eq!(config.mission_autonomy.host, "localhost");
    }

    #[test]
    fn test_override_bad_port() {
        let mut config = ClientConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "SKYLINK_MISSION_AUTONOMY_PORT").then(|| "ninety".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let mut config = ClientConfig::default();
        config.remote_control.host = "10.1.2.3".to_string();
        config.logging.level = LogLevel::Debug;

        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();
        let loaded = ClientConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
