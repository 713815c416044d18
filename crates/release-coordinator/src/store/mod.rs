//! Entity store.
//!
//! The [`Store`] trait is the persistence contract the orchestration core
//! depends on. [`PgStore`] backs it with PostgreSQL; [`MemoryStore`] keeps
//! everything in process for tests and local runs.
//!
//! State changes are compare-and-set: `transition_*` only writes when the
//! row still holds `from`, and reports whether it did.

pub mod memory;

use async_trait::async_trait;

use crate::db::models::{
    Event, EventFilter, Release, ReleaseFilter, Task, TaskFilter, TaskService, Version,
};
use crate::db::queries;
use crate::db::DbPool;
use crate::engine::state::{ReleaseState, TaskState};
use crate::error::AppResult;

pub use memory::MemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_release(&self, release: &Release) -> AppResult<()>;

    async fn get_release(&self, id: &str) -> AppResult<Option<Release>>;

    async fn list_releases(&self, filter: &ReleaseFilter) -> AppResult<Vec<Release>>;

    /// Compare-and-set the release state.
    async fn transition_release(
        &self,
        id: &str,
        from: ReleaseState,
        to: ReleaseState,
    ) -> AppResult<bool>;

    /// Compare-and-set the release to published together with its new version.
    async fn complete_release(
        &self,
        id: &str,
        from: ReleaseState,
        version: Version,
    ) -> AppResult<bool>;

    async fn create_task(&self, task: &Task) -> AppResult<()>;

    async fn get_task(&self, id: &str) -> AppResult<Option<Task>>;

    async fn list_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<Task>>;

    /// All tasks of a release in creation order.
    async fn tasks_for_release(&self, release_id: &str) -> AppResult<Vec<Task>> {
        self.list_tasks(&TaskFilter {
            release_id: Some(release_id.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Compare-and-set the task state.
    async fn transition_task(&self, id: &str, from: TaskState, to: TaskState)
        -> AppResult<bool>;

    async fn update_task_progress(&self, id: &str, progress: i32) -> AppResult<bool>;

    async fn create_task_service(&self, service: &TaskService) -> AppResult<()>;

    async fn get_task_service(&self, id: &str) -> AppResult<Option<TaskService>>;

    async fn list_task_services(&self, enabled_only: bool) -> AppResult<Vec<TaskService>>;

    async fn set_task_service_enabled(&self, id: &str, enabled: bool) -> AppResult<bool>;

    /// Reset (healthy) or increment (unhealthy) the failure streak and return
    /// its new value. `None` if the service does not exist.
    async fn record_health(&self, id: &str, healthy: bool) -> AppResult<Option<i32>>;

    async fn insert_event(&self, event: &Event) -> AppResult<()>;

    /// Events matching `filter`, newest first.
    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>>;

    async fn latest_release_event(&self, release_id: &str) -> AppResult<Option<Event>>;

    async fn latest_task_event(&self, task_id: &str) -> AppResult<Option<Event>>;

    /// Whether the backing storage is reachable.
    async fn health_check(&self) -> bool;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_release(&self, release: &Release) -> AppResult<()> {
        queries::release::insert_release(&self.pool, release).await
    }

    async fn get_release(&self, id: &str) -> AppResult<Option<Release>> {
        queries::release::get_release(&self.pool, id).await
    }

    async fn list_releases(&self, filter: &ReleaseFilter) -> AppResult<Vec<Release>> {
        queries::release::list_releases(&self.pool, filter).await
    }

    async fn transition_release(
        &self,
        id: &str,
        from: ReleaseState,
        to: ReleaseState,
    ) -> AppResult<bool> {
        queries::release::transition_release(&self.pool, id, from, to).await
    }

    async fn complete_release(
        &self,
        id: &str,
        from: ReleaseState,
        version: Version,
    ) -> AppResult<bool> {
        queries::release::complete_release(&self.pool, id, from, version).await
    }

    async fn create_task(&self, task: &Task) -> AppResult<()> {
        queries::task::insert_task(&self.pool, task).await
    }

    async fn get_task(&self, id: &str) -> AppResult<Option<Task>> {
        queries::task::get_task(&self.pool, id).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        queries::task::list_tasks(&self.pool, filter).await
    }

    async fn transition_task(
        &self,
        id: &str,
        from: TaskState,
        to: TaskState,
    ) -> AppResult<bool> {
        queries::task::transition_task(&self.pool, id, from, to).await
    }

    async fn update_task_progress(&self, id: &str, progress: i32) -> AppResult<bool> {
        queries::task::update_task_progress(&self.pool, id, progress).await
    }

    async fn create_task_service(&self, service: &TaskService) -> AppResult<()> {
        queries::task_service::insert_task_service(&self.pool, service).await
    }

    async fn get_task_service(&self, id: &str) -> AppResult<Option<TaskService>> {
        queries::task_service::get_task_service(&self.pool, id).await
    }

    async fn list_task_services(&self, enabled_only: bool) -> AppResult<Vec<TaskService>> {
        queries::task_service::list_task_services(&self.pool, enabled_only).await
    }

    async fn set_task_service_enabled(&self, id: &str, enabled: bool) -> AppResult<bool> {
        queries::task_service::set_enabled(&self.pool, id, enabled).await
    }

    async fn record_health(&self, id: &str, healthy: bool) -> AppResult<Option<i32>> {
        queries::task_service::record_health(&self.pool, id, healthy).await
    }

    async fn insert_event(&self, event: &Event) -> AppResult<()> {
        queries::event::insert_event(&self.pool, event).await
    }

    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>> {
        queries::event::list_events(&self.pool, filter).await
    }

    async fn latest_release_event(&self, release_id: &str) -> AppResult<Option<Event>> {
        queries::event::latest_release_event(&self.pool, release_id).await
    }

    async fn latest_task_event(&self, task_id: &str) -> AppResult<Option<Event>> {
        queries::event::latest_task_event(&self.pool, task_id).await
    }

    async fn health_check(&self) -> bool {
        crate::db::pool::health_check(&self.pool).await
    }
}
