//! Release orchestration.
//!
//! Drives a release through initialize, start, stage and publish by
//! commanding every task service and folding task states back into the
//! release:
//! - A release stages only once every task has staged, and publishes only
//!   once every task has published.
//! - Any task failure or cancellation escalates to the release, which in turn
//!   cancels every task that is still live.
//!
//! Every state change is a guarded compare-and-set followed by one event.
//! A transition that lost a race surfaces as `IllegalTransition` and is
//! discarded by the caller.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::db::models::{NewRelease, NewTaskService, Release, Task, TaskService};
use crate::engine::state::{Lifecycle, ReleaseState, ReleaseTransition, TaskState, TaskTransition};
use crate::error::{AppError, AppResult};
use crate::queue::{Job, WorkQueue};
use crate::result_ext::TransitionResultExt;
use crate::services::dispatcher::{Action, DispatchOutcome, TaskDispatcher, WorkerReport};
use crate::services::event::EventLog;
use crate::store::Store;

/// The reported state if it calls for a transition of `task`.
///
/// Only staged, published, failed and canceled reports are acted on, and
/// only when they differ from the stored state.
pub fn actionable_state(task: &Task, report: &WorkerReport) -> Option<TaskState> {
    let reported = report.task_state()?;
    let actionable = matches!(
        reported,
        TaskState::Staged | TaskState::Published | TaskState::Failed | TaskState::Canceled
    );
    (actionable && reported != task.state).then_some(reported)
}

/// Release orchestrator.
#[derive(Clone)]
pub struct ReleaseOrchestrator {
    store: Arc<dyn Store>,
    events: EventLog,
    dispatcher: TaskDispatcher,
    queue: Arc<dyn WorkQueue>,
}

impl ReleaseOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        queue: Arc<dyn WorkQueue>,
        dispatcher: TaskDispatcher,
    ) -> Self {
        Self {
            events: EventLog::new(store.clone()),
            store,
            dispatcher,
            queue,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Persist a new release and schedule its initialization.
    pub async fn create_release(&self, request: NewRelease) -> AppResult<Release> {
        request.validate()?;
        let release = Release::from_request(request);
        self.store.create_release(&release).await?;

        info!(release_id = %release.id, name = %release.name, "Release created");
        self.queue
            .enqueue(Job::InitRelease {
                release_id: release.id.clone(),
            })
            .await?;

        Ok(release)
    }

    /// Register a task service. It takes part in releases initialized from
    /// now on if enabled.
    pub async fn register_task_service(&self, request: NewTaskService) -> AppResult<TaskService> {
        request.validate()?;
        let service = TaskService::from_request(request);
        self.store.create_task_service(&service).await?;
        info!(task_service_id = %service.id, url = %service.url, "Task service registered");
        Ok(service)
    }

    /// Schedule publishing of a staged release.
    pub async fn request_publish(&self, release_id: &str) -> AppResult<()> {
        let release = self.load_release(release_id).await?;
        release.state.apply(ReleaseTransition::Publish)?;

        self.queue
            .enqueue(Job::PublishRelease {
                release_id: release.id,
            })
            .await
    }

    /// Move a release to canceling and schedule the cancellation.
    pub async fn request_cancel(&self, release_id: &str) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        self.move_release(&mut release, ReleaseTransition::Cancel)
            .await?;

        self.queue
            .enqueue(Job::CancelRelease {
                release_id: release.id,
                fail: false,
            })
            .await
    }

    /// Create one task per enabled task service and schedule their
    /// initialization. Without enabled services the release stages at once.
    pub async fn init_release(&self, release_id: &str) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        self.move_release(&mut release, ReleaseTransition::Initialize)
            .await?;

        let services = self.store.list_task_services(true).await?;
        if services.is_empty() {
            info!(release_id = %release.id, "No enabled task services, staging release");
            self.move_release(&mut release, ReleaseTransition::Start)
                .await?;
            self.move_release(&mut release, ReleaseTransition::Stage)
                .await?;
            return Ok(());
        }

        // All tasks exist before any is initialized so the fan-in check
        // never sees a partial set.
        let mut tasks = Vec::with_capacity(services.len());
        for service in &services {
            let task = Task::new(&release.id, &service.id);
            self.store.create_task(&task).await?;
            tasks.push(task);
        }

        info!(release_id = %release.id, tasks = tasks.len(), "Release tasks created");
        for task in tasks {
            self.queue.enqueue(Job::InitTask { task_id: task.id }).await?;
        }

        Ok(())
    }

    /// Ask the task's service to initialize it. Starts the release once the
    /// last task has initialized.
    pub async fn init_task(&self, task_id: &str) -> AppResult<()> {
        let mut task = self.load_task(task_id).await?;
        if task.state != TaskState::Waiting {
            debug!(task_id = %task.id, state = %task.state, "Task already initialized, skipping");
            return Ok(());
        }

        let release = self.load_release(&task.release_id).await?;
        if release.state != ReleaseState::Initializing {
            debug!(
                task_id = %task.id,
                release_id = %release.id,
                state = %release.state,
                "Release no longer initializing, skipping task"
            );
            return Ok(());
        }

        let outcome = self
            .dispatch(Action::Initialize, &task, &release.studies)
            .await?;
        if let Some(reason) = outcome.failure(None) {
            error!(task_id = %task.id, reason = %reason, "Task service did not accept initialize");
            self.events
                .dispatch_failure(&task, Action::Initialize, &reason)
                .await?;
            self.move_task(&mut task, TaskTransition::Reject)
                .await
                .discard_illegal()?;
            return self.escalate(&release.id, true).await;
        }

        if self
            .move_task(&mut task, TaskTransition::Initialize)
            .await
            .discard_illegal()?
            .is_none()
        {
            return Ok(());
        }

        if self
            .all_tasks_in(&release.id, TaskState::Initialized)
            .await?
        {
            debug!(release_id = %release.id, "All tasks initialized");
            self.queue
                .enqueue(Job::StartRelease {
                    release_id: release.id,
                })
                .await?;
        }

        Ok(())
    }

    /// Start the release and every initialized task. Stops at the first task
    /// service that does not accept.
    pub async fn start_release(&self, release_id: &str) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        self.move_release(&mut release, ReleaseTransition::Start)
            .await?;

        self.fan_out(
            &release,
            Action::Start,
            TaskState::Initialized,
            TaskTransition::Start,
        )
        .await
    }

    /// Publish a staged release. With no tasks it completes immediately.
    pub async fn publish_release(&self, release_id: &str) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        self.move_release(&mut release, ReleaseTransition::Publish)
            .await?;

        if self.store.tasks_for_release(&release.id).await?.is_empty() {
            return self.complete_release(&mut release).await;
        }

        self.fan_out(
            &release,
            Action::Publish,
            TaskState::Staged,
            TaskTransition::Publish,
        )
        .await
    }

    /// Cancel every live task and settle the release as failed (`fail`) or
    /// canceled. A release that already reached a terminal state is left
    /// untouched.
    pub async fn cancel_release(&self, release_id: &str, fail: bool) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        if release.state.is_terminal() {
            debug!(release_id = %release.id, state = %release.state, "Release already settled");
            return Ok(());
        }

        if release.state != ReleaseState::Canceling
            && self
                .move_release(&mut release, ReleaseTransition::Cancel)
                .await
                .discard_illegal()?
                .is_none()
        {
            return Ok(());
        }

        let tasks = self.store.tasks_for_release(&release.id).await?;
        for task in tasks.into_iter().filter(|t| !t.state.is_terminal()) {
            match self.dispatch(Action::Cancel, &task, &release.studies).await {
                Ok(outcome) => {
                    if let Some(reason) = outcome.failure(None) {
                        self.events
                            .dispatch_failure(&task, Action::Cancel, &reason)
                            .await?;
                    }
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Could not send cancel to task service");
                }
            }

            self.force_cancel(task).await?;
        }

        let settle = if fail {
            ReleaseTransition::Fail
        } else {
            ReleaseTransition::Canceled
        };
        self.move_release(&mut release, settle)
            .await
            .discard_illegal()?;

        Ok(())
    }

    /// Apply a state and progress report sent by a task service.
    pub async fn apply_status_update(&self, task_id: &str, report: &WorkerReport) -> AppResult<()> {
        let task = self.load_task(task_id).await?;
        self.apply_report(task, report).await
    }

    pub(crate) async fn apply_report(&self, mut task: Task, report: &WorkerReport) -> AppResult<()> {
        if report.state.is_some() && report.task_state().is_none() {
            debug!(task_id = %task.id, state = ?report.state, "Ignoring unknown reported state");
        }

        match actionable_state(&task, report) {
            Some(TaskState::Staged) => {
                let moved = self
                    .move_task(&mut task, TaskTransition::Stage)
                    .await
                    .discard_illegal()?;
                if moved.is_some() && self.all_tasks_in(&task.release_id, TaskState::Staged).await? {
                    let mut release = self.load_release(&task.release_id).await?;
                    self.move_release(&mut release, ReleaseTransition::Stage)
                        .await
                        .discard_illegal()?;
                }
            }
            Some(TaskState::Published) => {
                let moved = self
                    .move_task(&mut task, TaskTransition::Complete)
                    .await
                    .discard_illegal()?;
                if moved.is_some()
                    && self
                        .all_tasks_in(&task.release_id, TaskState::Published)
                        .await?
                {
                    let mut release = self.load_release(&task.release_id).await?;
                    self.complete_release(&mut release)
                        .await
                        .discard_illegal()?;
                }
            }
            Some(TaskState::Failed) => {
                if self
                    .move_task(&mut task, TaskTransition::Fail)
                    .await
                    .discard_illegal()?
                    .is_some()
                {
                    self.escalate(&task.release_id, true).await?;
                }
            }
            Some(TaskState::Canceled) => {
                if self
                    .move_task(&mut task, TaskTransition::Cancel)
                    .await
                    .discard_illegal()?
                    .is_some()
                {
                    self.escalate(&task.release_id, false).await?;
                }
            }
            _ => {}
        }

        self.record_progress(&task, report).await
    }

    /// Store reported progress. Unparseable values are ignored.
    pub(crate) async fn record_progress(&self, task: &Task, report: &WorkerReport) -> AppResult<()> {
        let Some(progress) = &report.progress else {
            return Ok(());
        };

        match progress.percent() {
            Some(percent) if percent != task.progress => {
                self.store.update_task_progress(&task.id, percent).await?;
            }
            Some(_) => {}
            None => {
                warn!(task_id = %task.id, ?progress, "Ignoring unparseable progress");
            }
        }
        Ok(())
    }

    /// Move the release to canceling and schedule the cancellation. Does
    /// nothing once the release has settled.
    pub(crate) async fn escalate(&self, release_id: &str, fail: bool) -> AppResult<()> {
        let mut release = self.load_release(release_id).await?;
        if self
            .move_release(&mut release, ReleaseTransition::Cancel)
            .await
            .discard_illegal()?
            .is_none()
        {
            debug!(release_id = %release.id, state = %release.state, "Release already settled, not escalating");
            return Ok(());
        }

        warn!(release_id = %release.id, fail, "Escalating to release cancellation");
        self.queue
            .enqueue(Job::CancelRelease {
                release_id: release.id,
                fail,
            })
            .await
    }

    /// Command every task in `eligible` state; on the first failure, fail that
    /// task and escalate.
    async fn fan_out(
        &self,
        release: &Release,
        action: Action,
        eligible: TaskState,
        on_accept: TaskTransition,
    ) -> AppResult<()> {
        let expected = eligible.apply(on_accept)?;

        for mut task in self.store.tasks_for_release(&release.id).await? {
            if task.state != eligible {
                debug!(task_id = %task.id, state = %task.state, action = %action, "Skipping task");
                continue;
            }

            let outcome = self.dispatch(action, &task, &release.studies).await?;
            if let Some(reason) = outcome.failure(Some(expected)) {
                error!(task_id = %task.id, action = %action, reason = %reason, "Task service did not accept command");
                self.events.dispatch_failure(&task, action, &reason).await?;
                self.move_task(&mut task, TaskTransition::Fail)
                    .await
                    .discard_illegal()?;
                return self.escalate(&release.id, true).await;
            }

            self.move_task(&mut task, on_accept)
                .await
                .discard_illegal()?;
        }

        Ok(())
    }

    /// Cancel `task`, re-reading it whenever a concurrent write moved it
    /// first. Returns once the task is terminal.
    async fn force_cancel(&self, mut task: Task) -> AppResult<()> {
        while !task.state.is_terminal() {
            match self.move_task(&mut task, TaskTransition::Cancel).await {
                Ok(()) => break,
                Err(e) if e.is_illegal_transition() => {
                    debug!(
                        task_id = %task.id,
                        stale = %task.state,
                        "Task moved during cancel, retrying"
                    );
                    task = self.load_task(&task.id).await?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub(crate) async fn dispatch(
        &self,
        action: Action,
        task: &Task,
        studies: &[String],
    ) -> AppResult<DispatchOutcome> {
        let service = self
            .store
            .get_task_service(&task.task_service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task service {}", task.task_service_id)))?;

        Ok(self
            .dispatcher
            .send(action, task, &service.url, studies)
            .await)
    }

    async fn all_tasks_in(&self, release_id: &str, state: TaskState) -> AppResult<bool> {
        let tasks = self.store.tasks_for_release(release_id).await?;
        Ok(!tasks.is_empty() && tasks.iter().all(|t| t.state == state))
    }

    pub(crate) async fn load_release(&self, id: &str) -> AppResult<Release> {
        self.store
            .get_release(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("release {}", id)))
    }

    pub(crate) async fn load_task(&self, id: &str) -> AppResult<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {}", id)))
    }

    pub(crate) async fn move_release(
        &self,
        release: &mut Release,
        transition: ReleaseTransition,
    ) -> AppResult<()> {
        let to = release.state.apply(transition)?;
        if !self
            .store
            .transition_release(&release.id, release.state, to)
            .await?
        {
            return Err(release.state.illegal(transition).into());
        }

        self.events.release_transition(release, to).await?;
        info!(release_id = %release.id, from = %release.state, to = %to, "Release transitioned");
        release.state = to;
        Ok(())
    }

    /// Publishing completes: set the bumped version together with the state.
    async fn complete_release(&self, release: &mut Release) -> AppResult<()> {
        let to = release.state.apply(ReleaseTransition::Complete)?;
        let version = release.version.bump(release.is_major);
        if !self
            .store
            .complete_release(&release.id, release.state, version)
            .await?
        {
            return Err(release.state.illegal(ReleaseTransition::Complete).into());
        }

        release.version = version;
        self.events.release_transition(release, to).await?;
        info!(release_id = %release.id, version = %version, "Release published");
        release.state = to;
        Ok(())
    }

    pub(crate) async fn move_task(
        &self,
        task: &mut Task,
        transition: TaskTransition,
    ) -> AppResult<()> {
        let to = task.state.apply(transition)?;
        if !self.store.transition_task(&task.id, task.state, to).await? {
            return Err(task.state.illegal(transition).into());
        }

        self.events.task_transition(task, to).await?;
        debug!(task_id = %task.id, from = %task.state, to = %to, "Task transitioned");
        task.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Event, EventFilter, ReleaseFilter, TaskFilter, Version};
    use crate::queue::LocalQueue;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Store that lets a task service report initialization in the window
    /// between the cancel loop reading a waiting task and moving it.
    struct InterleavedStore {
        inner: MemoryStore,
        raced: AtomicBool,
    }

    #[async_trait]
    impl Store for InterleavedStore {
        async fn create_release(&self, release: &Release) -> AppResult<()> {
            self.inner.create_release(release).await
        }

        async fn get_release(&self, id: &str) -> AppResult<Option<Release>> {
            self.inner.get_release(id).await
        }

        async fn list_releases(&self, filter: &ReleaseFilter) -> AppResult<Vec<Release>> {
            self.inner.list_releases(filter).await
        }

        async fn transition_release(
            &self,
            id: &str,
            from: ReleaseState,
            to: ReleaseState,
        ) -> AppResult<bool> {
            self.inner.transition_release(id, from, to).await
        }

        async fn complete_release(
            &self,
            id: &str,
            from: ReleaseState,
            version: Version,
        ) -> AppResult<bool> {
            self.inner.complete_release(id, from, version).await
        }

        async fn create_task(&self, task: &Task) -> AppResult<()> {
            self.inner.create_task(task).await
        }

        async fn get_task(&self, id: &str) -> AppResult<Option<Task>> {
            self.inner.get_task(id).await
        }

        async fn list_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<Task>> {
            self.inner.list_tasks(filter).await
        }

        async fn transition_task(
            &self,
            id: &str,
            from: TaskState,
            to: TaskState,
        ) -> AppResult<bool> {
            if from == TaskState::Waiting
                && to == TaskState::Canceled
                && !self.raced.swap(true, Ordering::SeqCst)
            {
                self.inner
                    .transition_task(id, TaskState::Waiting, TaskState::Initialized)
                    .await?;
            }
            self.inner.transition_task(id, from, to).await
        }

        async fn update_task_progress(&self, id: &str, progress: i32) -> AppResult<bool> {
            self.inner.update_task_progress(id, progress).await
        }

        async fn create_task_service(&self, service: &TaskService) -> AppResult<()> {
            self.inner.create_task_service(service).await
        }

        async fn get_task_service(&self, id: &str) -> AppResult<Option<TaskService>> {
            self.inner.get_task_service(id).await
        }

        async fn list_task_services(&self, enabled_only: bool) -> AppResult<Vec<TaskService>> {
            self.inner.list_task_services(enabled_only).await
        }

        async fn set_task_service_enabled(&self, id: &str, enabled: bool) -> AppResult<bool> {
            self.inner.set_task_service_enabled(id, enabled).await
        }

        async fn record_health(&self, id: &str, healthy: bool) -> AppResult<Option<i32>> {
            self.inner.record_health(id, healthy).await
        }

        async fn insert_event(&self, event: &Event) -> AppResult<()> {
            self.inner.insert_event(event).await
        }

        async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>> {
            self.inner.list_events(filter).await
        }

        async fn latest_release_event(&self, release_id: &str) -> AppResult<Option<Event>> {
            self.inner.latest_release_event(release_id).await
        }

        async fn latest_task_event(&self, task_id: &str) -> AppResult<Option<Event>> {
            self.inner.latest_task_event(task_id).await
        }

        async fn health_check(&self) -> bool {
            self.inner.health_check().await
        }
    }

    fn orchestrator() -> (Arc<MemoryStore>, Arc<LocalQueue>, ReleaseOrchestrator) {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(LocalQueue::new());
        let orchestrator = ReleaseOrchestrator::new(
            store.clone(),
            queue.clone(),
            TaskDispatcher::new(Duration::from_secs(1), None).unwrap(),
        );
        (store, queue, orchestrator)
    }

    #[test]
    fn test_actionable_state() {
        let mut task = Task::new("RE_AAAAAAAA", "TS_AAAAAAAA");
        task.state = TaskState::Running;

        let staged = WorkerReport::with_state(TaskState::Staged);
        assert_eq!(actionable_state(&task, &staged), Some(TaskState::Staged));

        let running = WorkerReport::with_state(TaskState::Running);
        assert_eq!(actionable_state(&task, &running), None);

        task.state = TaskState::Staged;
        assert_eq!(actionable_state(&task, &staged), None);
        assert_eq!(actionable_state(&task, &WorkerReport::default()), None);
    }

    #[tokio::test]
    async fn test_create_release_schedules_init() {
        let (store, queue, orchestrator) = orchestrator();
        let release = orchestrator
            .create_release(NewRelease::new("r", vec!["SD_AAAAAAAA".into()]))
            .await
            .unwrap();

        assert!(store.get_release(&release.id).await.unwrap().is_some());
        assert_eq!(
            queue.pending().await,
            vec![Job::InitRelease {
                release_id: release.id
            }]
        );
    }

    #[tokio::test]
    async fn test_create_release_rejects_bad_study() {
        let (_, queue, orchestrator) = orchestrator();
        let err = orchestrator
            .create_release(NewRelease::new("r", vec!["SD_1".into()]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_request_publish_requires_staged() {
        let (_, queue, orchestrator) = orchestrator();
        let release = orchestrator
            .create_release(NewRelease::new("r", vec![]))
            .await
            .unwrap();
        queue.pop().await;

        let err = orchestrator.request_publish(&release.id).await.unwrap_err();
        assert!(err.is_illegal_transition());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_request_cancel_moves_to_canceling() {
        let (store, queue, orchestrator) = orchestrator();
        let release = orchestrator
            .create_release(NewRelease::new("r", vec![]))
            .await
            .unwrap();
        queue.pop().await;

        orchestrator.request_cancel(&release.id).await.unwrap();
        let stored = store.get_release(&release.id).await.unwrap().unwrap();
        assert_eq!(stored.state, ReleaseState::Canceling);
        assert_eq!(
            queue.pending().await,
            vec![Job::CancelRelease {
                release_id: release.id,
                fail: false
            }]
        );
    }

    #[tokio::test]
    async fn test_stale_move_is_illegal() {
        let (store, _, orchestrator) = orchestrator();
        let release = Release::from_request(NewRelease::new("r", vec![]));
        store.create_release(&release).await.unwrap();

        let mut stale = release.clone();
        let mut fresh = release.clone();
        orchestrator
            .move_release(&mut fresh, ReleaseTransition::Initialize)
            .await
            .unwrap();

        let err = orchestrator
            .move_release(&mut stale, ReleaseTransition::Cancel)
            .await
            .unwrap_err();
        assert!(err.is_illegal_transition());
        assert_eq!(stale.state, ReleaseState::Waiting);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_release_retries_task_moved_concurrently() {
        let mut server = mockito::Server::new_async().await;
        let cancel = server
            .mock("POST", "/tasks")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"action": "cancel"}),
            ))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(InterleavedStore {
            inner: MemoryStore::new(),
            raced: AtomicBool::new(false),
        });
        let orchestrator = ReleaseOrchestrator::new(
            store.clone(),
            Arc::new(LocalQueue::new()),
            TaskDispatcher::new(Duration::from_secs(1), None).unwrap(),
        );

        let service = TaskService::from_request(NewTaskService::new("ds", &server.url()));
        store.create_task_service(&service).await.unwrap();
        let release = Release::from_request(NewRelease::new("r", vec![]));
        store.create_release(&release).await.unwrap();
        let task = Task::new(&release.id, &service.id);
        store.create_task(&task).await.unwrap();

        orchestrator.cancel_release(&release.id, true).await.unwrap();

        cancel.assert_async().await;
        assert!(store.raced.load(Ordering::SeqCst));
        let task = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(task.state, TaskState::Canceled);
        let release = store.get_release(&release.id).await.unwrap().unwrap();
        assert_eq!(release.state, ReleaseState::Failed);
    }

    #[tokio::test]
    async fn test_unparseable_progress_is_ignored() {
        let (store, _, orchestrator) = orchestrator();
        let task = Task::new("RE_AAAAAAAA", "TS_AAAAAAAA");
        store.create_task(&task).await.unwrap();

        let report: WorkerReport =
            serde_json::from_value(serde_json::json!({"progress": "lots"})).unwrap();
        orchestrator
            .apply_status_update(&task.id, &report)
            .await
            .unwrap();
        assert_eq!(store.get_task(&task.id).await.unwrap().unwrap().progress, 0);

        let report: WorkerReport =
            serde_json::from_value(serde_json::json!({"progress": "50%"})).unwrap();
        orchestrator
            .apply_status_update(&task.id, &report)
            .await
            .unwrap();
        assert_eq!(store.get_task(&task.id).await.unwrap().unwrap().progress, 50);
    }
}
