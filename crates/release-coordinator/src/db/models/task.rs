//! Task database model.
//!
//! A task is the unit of work one task service performs for one release.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::engine::state::{Lifecycle, TaskState};
use crate::error::AppError;
use crate::ids;

/// A task run by a task service as part of a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Task ID (`TA_` prefix)
    pub id: String,

    /// Current lifecycle state
    pub state: TaskState,

    /// Percent complete, 0 to 100
    pub progress: i32,

    /// Owning release
    pub release_id: String,

    /// Task service that runs this task
    pub task_service_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A new waiting task for `release_id` on `task_service_id`.
    pub fn new(release_id: &str, task_service_id: &str) -> Self {
        Self {
            id: ids::task_id(),
            state: TaskState::Waiting,
            progress: 0,
            release_id: release_id.to_string(),
            task_service_id: task_service_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub release_id: Option<String>,

    #[serde(default)]
    pub task_service_id: Option<String>,

    #[serde(default)]
    pub states: Option<Vec<TaskState>>,
}

impl TaskFilter {
    /// Tasks that have not reached a terminal state.
    pub fn active() -> Self {
        Self {
            states: Some(
                TaskState::ALL
                    .into_iter()
                    .filter(|s| !s.is_terminal())
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.release_id
            .as_ref()
            .map_or(true, |id| *id == task.release_id)
            && self
                .task_service_id
                .as_ref()
                .map_or(true, |id| *id == task.task_service_id)
            && self
                .states
                .as_ref()
                .map_or(true, |states| states.contains(&task.state))
    }

    pub(crate) fn state_names(&self) -> Option<Vec<String>> {
        self.states
            .as_ref()
            .map(|states| states.iter().map(|s| s.as_str().to_string()).collect())
    }
}

/// Row as stored in `coordinator.task`.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub state: String,
    pub progress: i32,
    pub release_id: String,
    pub task_service_id: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            state: row.state.parse().map_err(AppError::Internal)?,
            id: row.id,
            progress: row.progress,
            release_id: row.release_id,
            task_service_id: row.task_service_id,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_waiting() {
        let task = Task::new("RE_AAAAAAAA", "TS_AAAAAAAA");
        assert_eq!(task.state, TaskState::Waiting);
        assert_eq!(task.progress, 0);
        assert!(ids::is_valid(&task.id, ids::TASK_PREFIX));
    }

    #[test]
    fn test_active_filter_excludes_terminal() {
        let mut task = Task::new("RE_AAAAAAAA", "TS_AAAAAAAA");
        let filter = TaskFilter::active();
        assert!(filter.matches(&task));
        task.state = TaskState::Rejected;
        assert!(!filter.matches(&task));
    }

    #[test]
    fn test_row_with_unknown_state_is_rejected() {
        let row = TaskRow {
            id: "TA_AAAAAAAA".into(),
            state: "pending".into(),
            progress: 0,
            release_id: "RE_AAAAAAAA".into(),
            task_service_id: "TS_AAAAAAAA".into(),
            created_at: Utc::now(),
        };
        assert!(Task::try_from(row).is_err());
    }
}
