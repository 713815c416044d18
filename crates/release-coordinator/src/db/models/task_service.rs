//! Task service database model.
//!
//! A task service is an external worker registered with the coordinator.
//! Only enabled services receive tasks when a release is initialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::ids;

/// Number of consecutive failed health checks tolerated before a service is
/// reported down.
pub const MAX_FAILED_CHECKS: i32 = 3;

/// Derived health of a task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Down,
}

impl HealthStatus {
    /// Health for a given number of consecutive failed checks.
    pub fn from_streak(failed_checks: i32) -> Self {
        if failed_checks <= MAX_FAILED_CHECKS {
            HealthStatus::Ok
        } else {
            HealthStatus::Down
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Ok => write!(f, "ok"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

/// A registered task service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct TaskService {
    /// Task service ID (`TS_` prefix)
    pub id: String,

    /// Service name
    pub name: String,

    /// Root URL of the service API
    pub url: String,

    /// The user who registered the service
    pub author: String,

    /// What the service does
    pub description: String,

    /// Only enabled services take part in new releases
    pub enabled: bool,

    /// Consecutive failed health checks since the last success
    pub last_ok_status: i32,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl TaskService {
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_streak(self.last_ok_status)
    }

    pub fn from_request(request: NewTaskService) -> Self {
        Self {
            id: ids::task_service_id(),
            name: request.name,
            url: request.url.trim_end_matches('/').to_string(),
            author: request.author,
            description: request.description,
            enabled: request.enabled,
            last_ok_status: 0,
            created_at: Utc::now(),
        }
    }
}

/// Request to register a task service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskService {
    pub name: String,
    pub url: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewTaskService {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            author: "admin".to_string(),
            description: String::new(),
            enabled: true,
        }
    }

    /// Basic shape checks. Reachability of the endpoint is not verified here.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("task service name is required".into()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(AppError::Validation(format!(
                "{} is not an http(s) url",
                self.url
            )));
        }
        Ok(())
    }
}
