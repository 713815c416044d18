//! Event model.
//!
//! Events form the append-only audit trail of the coordinator. Every state
//! transition writes exactly one event; events are never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use crate::ids;

/// Severity of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Info => "info",
            EventType::Warning => "warning",
            EventType::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(EventType::Info),
            "warning" => Ok(EventType::Warning),
            "error" => Ok(EventType::Error),
            other => Err(format!("Unknown event type: {}", other)),
        }
    }
}

/// A stored event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Event ID (`EV_` prefix)
    pub id: String,

    pub event_type: EventType,

    /// Human readable description
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_service_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// An event about to be appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: Option<EventType>,
    pub message: String,
    pub release_id: Option<String>,
    pub task_id: Option<String>,
    pub task_service_id: Option<String>,
}

impl NewEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            event_type: Some(EventType::Info),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            event_type: Some(EventType::Error),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_release(mut self, release_id: &str) -> Self {
        self.release_id = Some(release_id.to_string());
        self
    }

    pub fn with_task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }

    pub fn with_task_service(mut self, task_service_id: &str) -> Self {
        self.task_service_id = Some(task_service_id.to_string());
        self
    }

    /// Assign an id and timestamp.
    pub fn into_event(self) -> Event {
        Event {
            id: ids::event_id(),
            event_type: self.event_type.unwrap_or(EventType::Info),
            message: self.message,
            release_id: self.release_id,
            task_id: self.task_id,
            task_service_id: self.task_service_id,
            created_at: Utc::now(),
        }
    }
}

/// Filter for listing events. Results are newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub release_id: Option<String>,

    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(default)]
    pub task_service_id: Option<String>,

    #[serde(default)]
    pub event_type: Option<EventType>,

    #[serde(default)]
    pub limit: Option<i64>,
}

impl EventFilter {
    pub fn for_release(release_id: &str) -> Self {
        Self {
            release_id: Some(release_id.to_string()),
            ..Default::default()
        }
    }

    pub fn for_task(task_id: &str) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        fn eq(want: &Option<String>, have: &Option<String>) -> bool {
            want.is_none() || want == have
        }

        eq(&self.release_id, &event.release_id)
            && eq(&self.task_id, &event.task_id)
            && eq(&self.task_service_id, &event.task_service_id)
            && self.event_type.map_or(true, |t| t == event.event_type)
    }
}

/// Row as stored in `coordinator.event`.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: String,
    pub event_type: String,
    pub message: String,
    pub release_id: Option<String>,
    pub task_id: Option<String>,
    pub task_service_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_type: row.event_type.parse().map_err(AppError::Internal)?,
            id: row.id,
            message: row.message,
            release_id: row.release_id,
            task_id: row.task_id,
            task_service_id: row.task_service_id,
            created_at: row.created_at,
        })
    }
}
