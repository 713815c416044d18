//! Event log.
//!
//! Append-only audit trail. Every successful transition is followed by
//! exactly one call into this service.

use std::sync::Arc;

use crate::db::models::{Event, EventType, NewEvent, Release, Task};
use crate::engine::state::{ReleaseState, TaskState};
use crate::error::AppResult;
use crate::services::dispatcher::Action;
use crate::store::Store;

/// Service for writing events.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn Store>,
}

impl EventLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append an event.
    pub async fn record(&self, event: NewEvent) -> AppResult<Event> {
        let event = event.into_event();
        self.store.insert_event(&event).await?;
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            message = %event.message,
            "Event recorded"
        );
        Ok(event)
    }

    /// Record a release moving from its current state to `to`.
    ///
    /// `release` is the record before the move; the version shown is the one
    /// the release carries after it.
    pub async fn release_transition(
        &self,
        release: &Release,
        to: ReleaseState,
    ) -> AppResult<Event> {
        let message = format!(
            "release {}, version {} changed from {} to {}",
            release.id, release.version, release.state, to
        );
        let event = if to == ReleaseState::Failed {
            NewEvent::error(message)
        } else {
            NewEvent::info(message)
        };
        self.record(event.with_release(&release.id)).await
    }

    /// Record a task moving from its current state to `to`.
    pub async fn task_transition(&self, task: &Task, to: TaskState) -> AppResult<Event> {
        let message = format!("task {} changed from {} to {}", task.id, task.state, to);
        let event = if matches!(to, TaskState::Failed | TaskState::Rejected) {
            NewEvent::error(message)
        } else {
            NewEvent::info(message)
        };
        self.record(
            event
                .with_release(&task.release_id)
                .with_task(&task.id)
                .with_task_service(&task.task_service_id),
        )
        .await
    }

    /// Record a command a task service did not accept.
    pub async fn dispatch_failure(
        &self,
        task: &Task,
        action: Action,
        reason: &str,
    ) -> AppResult<Event> {
        self.record(
            NewEvent::error(format!("request to {} task failed: {}", action, reason))
                .with_release(&task.release_id)
                .with_task(&task.id)
                .with_task_service(&task.task_service_id),
        )
        .await
    }

    /// Record a warning about a task service.
    pub async fn service_warning(&self, task_service_id: &str, message: String) -> AppResult<Event> {
        let event = NewEvent {
            event_type: Some(EventType::Warning),
            message,
            ..Default::default()
        };
        self.record(event.with_task_service(task_service_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{EventFilter, NewRelease};
    use crate::store::MemoryStore;

    fn log() -> (Arc<MemoryStore>, EventLog) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), EventLog::new(store))
    }

    #[tokio::test]
    async fn test_release_transition_message() {
        let (_, events) = log();
        let release = Release::from_request(NewRelease::new("r", vec![]));

        let event = events
            .release_transition(&release, ReleaseState::Initializing)
            .await
            .unwrap();
        assert_eq!(
            event.message,
            format!(
                "release {}, version 0.0.0 changed from waiting to initializing",
                release.id
            )
        );
        assert_eq!(event.event_type, EventType::Info);

        let failed = events
            .release_transition(&release, ReleaseState::Failed)
            .await
            .unwrap();
        assert_eq!(failed.event_type, EventType::Error);
    }

    #[tokio::test]
    async fn test_task_events_reference_task() {
        let (store, events) = log();
        let task = Task::new("RE_AAAAAAAA", "TS_AAAAAAAA");

        events
            .task_transition(&task, TaskState::Rejected)
            .await
            .unwrap();
        events
            .dispatch_failure(&task, Action::Initialize, "connection refused")
            .await
            .unwrap();

        let recorded = store.list_events(&EventFilter::for_task(&task.id)).await.unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|e| e.event_type == EventType::Error));
        assert_eq!(
            recorded[0].message,
            "request to initialize task failed: connection refused"
        );
        assert_eq!(
            recorded[1].message,
            format!("task {} changed from waiting to rejected", task.id)
        );
        assert_eq!(recorded[0].task_service_id.as_deref(), Some("TS_AAAAAAAA"));
    }
}
