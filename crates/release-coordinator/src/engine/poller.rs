//! Status polling and inactivity timeouts.
//!
//! Task services are asked for task status on a schedule. A report that
//! names a new actionable state is applied exactly like a pushed update.
//! Tasks and releases with no recorded activity for longer than their
//! timeout are canceled.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::engine::orchestrator::{actionable_state, ReleaseOrchestrator};
use crate::engine::state::{Lifecycle, ReleaseState, TaskState, TaskTransition};
use crate::error::AppResult;
use crate::result_ext::TransitionResultExt;
use crate::services::dispatcher::Action;

/// Time elapsed since `since`; zero if `since` lies in the future.
pub fn inactive_for(since: DateTime<Utc>) -> Duration {
    (Utc::now() - since).to_std().unwrap_or_default()
}

#[derive(Clone)]
pub struct StatusPoller {
    orchestrator: ReleaseOrchestrator,
    task_timeout: Duration,
    release_timeout: Duration,
}

impl StatusPoller {
    pub fn new(
        orchestrator: ReleaseOrchestrator,
        task_timeout: Duration,
        release_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator,
            task_timeout,
            release_timeout,
        }
    }

    /// Ask the task's service for its status and act on the answer.
    pub async fn poll_task(&self, task_id: &str) -> AppResult<()> {
        let orchestrator = &self.orchestrator;
        let mut task = orchestrator.load_task(task_id).await?;
        if task.state.is_terminal() {
            debug!(task_id = %task.id, state = %task.state, "Task settled, not polling");
            return Ok(());
        }

        let release = orchestrator.load_release(&task.release_id).await?;
        let outcome = orchestrator
            .dispatch(Action::GetStatus, &task, &release.studies)
            .await?;

        if let Some(reason) = outcome.failure(None) {
            orchestrator
                .events()
                .dispatch_failure(&task, Action::GetStatus, &reason)
                .await?;
            if !matches!(
                release.state,
                ReleaseState::Canceling | ReleaseState::Canceled
            ) {
                orchestrator.escalate(&release.id, true).await?;
            }
            orchestrator
                .move_task(&mut task, TaskTransition::Fail)
                .await
                .discard_illegal()?;
            return Ok(());
        }

        let report = outcome.into_report().unwrap_or_default();
        if actionable_state(&task, &report).is_some() {
            return orchestrator.apply_report(task, &report).await;
        }

        if task.state != TaskState::Staged {
            let last_activity = orchestrator
                .store()
                .latest_task_event(&task.id)
                .await?
                .map(|event| event.created_at)
                .unwrap_or(task.created_at);

            if inactive_for(last_activity) > self.task_timeout {
                warn!(
                    task_id = %task.id,
                    release_id = %release.id,
                    last_activity = %last_activity,
                    "Task timed out"
                );
                if release.state != ReleaseState::Canceling {
                    orchestrator.escalate(&release.id, false).await?;
                }
                return Ok(());
            }
        }

        orchestrator.record_progress(&task, &report).await
    }

    /// Cancel a release that has been idle too long, or that has an
    /// unsuccessful task nobody escalated.
    pub async fn poll_release(&self, release_id: &str) -> AppResult<()> {
        let orchestrator = &self.orchestrator;
        let release = orchestrator.load_release(release_id).await?;
        if release.state.is_terminal() || release.state == ReleaseState::Canceling {
            return Ok(());
        }

        let last_activity = orchestrator
            .store()
            .latest_release_event(&release.id)
            .await?
            .map(|event| event.created_at)
            .unwrap_or(release.created_at);

        if inactive_for(last_activity) > self.release_timeout {
            warn!(release_id = %release.id, last_activity = %last_activity, "Release timed out");
            return orchestrator.escalate(&release.id, false).await;
        }

        let tasks = orchestrator.store().tasks_for_release(&release.id).await?;
        if let Some(task) = tasks.iter().find(|t| t.state.is_unsuccessful()) {
            warn!(
                release_id = %release.id,
                task_id = %task.id,
                state = %task.state,
                "Release has an unsuccessful task"
            );
            return orchestrator.escalate(&release.id, true).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_for_future_is_zero() {
        let future = Utc::now() + chrono::Duration::seconds(30);
        assert_eq!(inactive_for(future), Duration::ZERO);
        assert!(inactive_for(Utc::now() - chrono::Duration::seconds(30)) >= Duration::from_secs(29));
    }
}
