//! Work queue.
//!
//! Orchestration steps are serializable [`Job`] values. A [`WorkQueue`]
//! accepts them with at-least-once, unordered delivery; a [`JobHandler`]
//! executes them. Every handler enqueues its own follow-up steps.

pub mod channel;
pub mod local;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub use channel::{spawn_workers, ChannelQueue, JobReceiver};
pub use local::LocalQueue;

/// One orchestration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    InitRelease { release_id: String },
    InitTask { task_id: String },
    StartRelease { release_id: String },
    PublishRelease { release_id: String },
    CancelRelease { release_id: String, fail: bool },
    HealthCheck { task_service_id: String },
    PollTask { task_id: String },
    PollRelease { release_id: String },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::InitRelease { .. } => "init_release",
            Job::InitTask { .. } => "init_task",
            Job::StartRelease { .. } => "start_release",
            Job::PublishRelease { .. } => "publish_release",
            Job::CancelRelease { .. } => "cancel_release",
            Job::HealthCheck { .. } => "health_check",
            Job::PollTask { .. } => "poll_task",
            Job::PollRelease { .. } => "poll_release",
        }
    }

    /// The entity the job acts on.
    pub fn subject(&self) -> &str {
        match self {
            Job::InitRelease { release_id }
            | Job::StartRelease { release_id }
            | Job::PublishRelease { release_id }
            | Job::CancelRelease { release_id, .. }
            | Job::PollRelease { release_id } => release_id,
            Job::InitTask { task_id } | Job::PollTask { task_id } => task_id,
            Job::HealthCheck { task_service_id } => task_service_id,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.subject())
    }
}

/// Accepts jobs for later execution.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> AppResult<()>;
}

/// Executes jobs taken off a queue.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: Job) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_wire_format() {
        let job = Job::CancelRelease {
            release_id: "RE_AAAAAAAA".into(),
            fail: true,
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"job": "cancel_release", "release_id": "RE_AAAAAAAA", "fail": true})
        );
        assert_eq!(job.to_string(), "cancel_release(RE_AAAAAAAA)");
    }
}
