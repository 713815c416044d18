//! Application configuration for the Release Coordinator.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `COORDINATOR_`:
/// - `COORDINATOR_HOST`: Bind address for the liveness server (default: "0.0.0.0")
/// - `COORDINATOR_PORT`: Liveness server port (default: 5000)
/// - `COORDINATOR_REQUEST_TIMEOUT`: Seconds to wait on a task service command (default: 15)
/// - `COORDINATOR_HEALTH_CHECK_TIMEOUT`: Seconds to wait on a `/status` ping (default: 15)
/// - `COORDINATOR_TASK_TIMEOUT`: Seconds without a task event before the release is canceled
/// - `COORDINATOR_RELEASE_TIMEOUT`: Seconds without a release event before it is canceled
/// - `COORDINATOR_QUEUE_WORKERS`: Number of job workers (default: 4)
/// - `COORDINATOR_HEALTH_SWEEP_INTERVAL`: Seconds between health sweeps (default: 60)
/// - `COORDINATOR_STATUS_SWEEP_INTERVAL`: Seconds between status sweeps (default: 30)
/// - `COORDINATOR_SERVICE_TOKEN`: Bearer token sent to task services (optional)
/// - `COORDINATOR_LOG_JSON`: Emit logs as JSON (default: false)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default = "default_request_timeout")]
    pub health_check_timeout: u64,

    #[serde(default = "default_task_timeout")]
    pub task_timeout: u64,

    #[serde(default = "default_release_timeout")]
    pub release_timeout: u64,

    #[serde(default = "default_queue_workers")]
    pub queue_workers: usize,

    #[serde(default = "default_health_sweep_interval")]
    pub health_sweep_interval: u64,

    #[serde(default = "default_status_sweep_interval")]
    pub status_sweep_interval: u64,

    /// Bearer token attached to every task service command
    #[serde(default)]
    pub service_token: Option<String>,

    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    15
}

fn default_task_timeout() -> u64 {
    160_000
}

fn default_release_timeout() -> u64 {
    360_000
}

fn default_queue_workers() -> usize {
    4
}

fn default_health_sweep_interval() -> u64 {
    60
}

fn default_status_sweep_interval() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from `COORDINATOR_*` environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("COORDINATOR_").from_env::<AppConfig>()
    }

    /// Server bind address suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_secs(self.release_timeout)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            health_check_timeout: default_request_timeout(),
            task_timeout: default_task_timeout(),
            release_timeout: default_release_timeout(),
            queue_workers: default_queue_workers(),
            health_sweep_interval: default_health_sweep_interval(),
            status_sweep_interval: default_status_sweep_interval(),
            service_token: None,
            log_json: false,
        }
    }
}
