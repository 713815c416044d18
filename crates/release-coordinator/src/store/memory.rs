//! In-memory store implementation.
//!
//! [`MemoryStore`] implements [`Store`] with plain vectors behind a tokio
//! `RwLock`. It has no durability and is meant for tests and local runs.
//! Every compare-and-set runs under the write lock, so it gives the same
//! race semantics as the PostgreSQL store within one process.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Store;
use crate::db::models::{
    Event, EventFilter, Release, ReleaseFilter, Task, TaskFilter, TaskService, Version,
};
use crate::engine::state::{ReleaseState, TaskState};
use crate::error::{AppError, AppResult};

#[derive(Debug, Default)]
struct Tables {
    releases: Vec<Release>,
    tasks: Vec<Task>,
    task_services: Vec<TaskService>,
    /// Append order doubles as creation order.
    events: Vec<Event>,
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub async fn event_count(&self) -> usize {
        self.tables.read().await.events.len()
    }
}

fn duplicate(kind: &str, id: &str) -> AppError {
    AppError::Validation(format!("{} {} already exists", kind, id))
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_release(&self, release: &Release) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.releases.iter().any(|r| r.id == release.id) {
            return Err(duplicate("release", &release.id));
        }
        tables.releases.push(release.clone());
        Ok(())
    }

    async fn get_release(&self, id: &str) -> AppResult<Option<Release>> {
        let tables = self.tables.read().await;
        Ok(tables.releases.iter().find(|r| r.id == id).cloned())
    }

    async fn list_releases(&self, filter: &ReleaseFilter) -> AppResult<Vec<Release>> {
        let tables = self.tables.read().await;
        Ok(tables
            .releases
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn transition_release(
        &self,
        id: &str,
        from: ReleaseState,
        to: ReleaseState,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .releases
            .iter_mut()
            .find(|r| r.id == id && r.state == from)
        {
            Some(release) => {
                release.state = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_release(
        &self,
        id: &str,
        from: ReleaseState,
        version: Version,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .releases
            .iter_mut()
            .find(|r| r.id == id && r.state == from)
        {
            Some(release) => {
                release.state = ReleaseState::Published;
                release.version = version;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_task(&self, task: &Task) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.tasks.iter().any(|t| t.id == task.id) {
            return Err(duplicate("task", &task.id));
        }
        tables.tasks.push(task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> AppResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn transition_task(
        &self,
        id: &str,
        from: TaskState,
        to: TaskState,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.state == from)
        {
            Some(task) => {
                task.state = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_task_progress(&self, id: &str, progress: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.progress = progress;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_task_service(&self, service: &TaskService) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.task_services.iter().any(|s| s.id == service.id) {
            return Err(duplicate("task service", &service.id));
        }
        tables.task_services.push(service.clone());
        Ok(())
    }

    async fn get_task_service(&self, id: &str) -> AppResult<Option<TaskService>> {
        let tables = self.tables.read().await;
        Ok(tables.task_services.iter().find(|s| s.id == id).cloned())
    }

    async fn list_task_services(&self, enabled_only: bool) -> AppResult<Vec<TaskService>> {
        let tables = self.tables.read().await;
        Ok(tables
            .task_services
            .iter()
            .filter(|s| !enabled_only || s.enabled)
            .cloned()
            .collect())
    }

    async fn set_task_service_enabled(&self, id: &str, enabled: bool) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.task_services.iter_mut().find(|s| s.id == id) {
            Some(service) => {
                service.enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_health(&self, id: &str, healthy: bool) -> AppResult<Option<i32>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .task_services
            .iter_mut()
            .find(|s| s.id == id)
            .map(|service| {
                service.last_ok_status = if healthy {
                    0
                } else {
                    service.last_ok_status + 1
                };
                service.last_ok_status
            }))
    }

    async fn insert_event(&self, event: &Event) -> AppResult<()> {
        self.tables.write().await.events.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>> {
        let tables = self.tables.read().await;
        let matching = tables.events.iter().rev().filter(|e| filter.matches(e));
        Ok(match filter.limit {
            Some(limit) => matching.take(limit.max(0) as usize).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn latest_release_event(&self, release_id: &str) -> AppResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .find(|e| e.release_id.as_deref() == Some(release_id))
            .cloned())
    }

    async fn latest_task_event(&self, task_id: &str) -> AppResult<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .rev()
            .find(|e| e.task_id.as_deref() == Some(task_id))
            .cloned())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
