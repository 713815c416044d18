//! Shared fixtures for the orchestration tests.
//!
//! Releases run against a [`MemoryStore`] and a [`LocalQueue`]; task
//! services are mockito servers answering `POST /tasks`.

#![allow(dead_code)]

use std::sync::Arc;

use mockito::{Matcher, Mock, ServerGuard};

use release_coordinator::config::AppConfig;
use release_coordinator::db::models::{
    Event, EventFilter, NewRelease, NewTaskService, Release, Task, TaskService,
};
use release_coordinator::engine::Coordinator;
use release_coordinator::queue::LocalQueue;
use release_coordinator::store::{MemoryStore, Store};

pub const STUDY: &str = "SD_ME0WME0W";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub queue: Arc<LocalQueue>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(LocalQueue::new());
        let coordinator = Coordinator::new(store.clone(), queue.clone(), &config).unwrap();
        Self {
            store,
            queue,
            coordinator,
        }
    }

    pub async fn register(&self, name: &str, url: &str) -> TaskService {
        self.coordinator
            .orchestrator()
            .register_task_service(NewTaskService::new(name, url))
            .await
            .unwrap()
    }

    pub async fn create_release(&self, is_major: bool) -> Release {
        let mut request = NewRelease::new("integration", vec![STUDY.to_string()]);
        request.is_major = is_major;
        self.coordinator
            .orchestrator()
            .create_release(request)
            .await
            .unwrap()
    }

    /// Run queued jobs until none are left.
    pub async fn drain(&self) -> usize {
        self.queue.burst(&self.coordinator).await
    }

    pub async fn release(&self, id: &str) -> Release {
        self.store.get_release(id).await.unwrap().unwrap()
    }

    pub async fn task(&self, id: &str) -> Task {
        self.store.get_task(id).await.unwrap().unwrap()
    }

    pub async fn tasks(&self, release_id: &str) -> Vec<Task> {
        self.store.tasks_for_release(release_id).await.unwrap()
    }

    /// The release's task on the given task service.
    pub async fn task_on(&self, release_id: &str, service: &TaskService) -> Task {
        self.tasks(release_id)
            .await
            .into_iter()
            .find(|t| t.task_service_id == service.id)
            .unwrap()
    }

    pub async fn events(&self, filter: EventFilter) -> Vec<Event> {
        self.store.list_events(&filter).await.unwrap()
    }
}

fn action_mock(server: &mut ServerGuard, action: &str, status: usize, body: &str) -> Mock {
    server
        .mock("POST", "/tasks")
        .match_body(Matcher::PartialJson(serde_json::json!({ "action": action })))
        .with_status(status)
        .with_body(body)
}

/// Answer one action on `POST /tasks`.
pub async fn on_action(server: &mut ServerGuard, action: &str, status: usize, body: &str) -> Mock {
    action_mock(server, action, status, body).create_async().await
}

/// Like [`on_action`], expecting exactly `times` requests.
pub async fn on_action_times(
    server: &mut ServerGuard,
    action: &str,
    status: usize,
    body: &str,
    times: usize,
) -> Mock {
    action_mock(server, action, status, body)
        .expect(times)
        .create_async()
        .await
}

/// Mocks for a task service that accepts initialize and start, keeping them
/// alive for the caller.
pub async fn accepting_worker(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        on_action(server, "initialize", 200, r#"{"state": "initialized"}"#).await,
        on_action(server, "start", 200, r#"{"state": "running"}"#).await,
        on_action(server, "publish", 200, r#"{"state": "publishing"}"#).await,
        on_action(server, "cancel", 200, "").await,
    ]
}
