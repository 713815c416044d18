//! Job dispatch and periodic sweeps.
//!
//! [`Coordinator`] is the [`JobHandler`] the queue workers run. It routes
//! each [`Job`] to the orchestrator, poller or health monitor and swallows
//! transitions that lost a race.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, Instrument};

use crate::config::AppConfig;
use crate::db::models::{ReleaseFilter, TaskFilter};
use crate::engine::orchestrator::ReleaseOrchestrator;
use crate::engine::poller::StatusPoller;
use crate::error::AppResult;
use crate::queue::{Job, JobHandler, WorkQueue};
use crate::result_ext::TransitionResultExt;
use crate::services::{EventLog, HealthMonitor, TaskDispatcher};
use crate::store::Store;

#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn Store>,
    queue: Arc<dyn WorkQueue>,
    orchestrator: ReleaseOrchestrator,
    poller: StatusPoller,
    health: HealthMonitor,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn Store>,
        queue: Arc<dyn WorkQueue>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let dispatcher =
            TaskDispatcher::new(config.request_timeout(), config.service_token.clone())?;
        let orchestrator = ReleaseOrchestrator::new(store.clone(), queue.clone(), dispatcher);
        let poller = StatusPoller::new(
            orchestrator.clone(),
            config.task_timeout(),
            config.release_timeout(),
        );
        let health = HealthMonitor::new(
            store.clone(),
            EventLog::new(store.clone()),
            config.health_check_timeout(),
        )?;

        Ok(Self {
            store,
            queue,
            orchestrator,
            poller,
            health,
        })
    }

    pub fn orchestrator(&self) -> &ReleaseOrchestrator {
        &self.orchestrator
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// Run one job. An illegal transition means another actor got there
    /// first and is not an error.
    pub async fn execute(&self, job: Job) -> AppResult<()> {
        let span = tracing::info_span!("job", job = job.name(), subject = %job.subject());

        async move {
            let result = match job {
                Job::InitRelease { release_id } => self.orchestrator.init_release(&release_id).await,
                Job::InitTask { task_id } => self.orchestrator.init_task(&task_id).await,
                Job::StartRelease { release_id } => {
                    self.orchestrator.start_release(&release_id).await
                }
                Job::PublishRelease { release_id } => {
                    self.orchestrator.publish_release(&release_id).await
                }
                Job::CancelRelease { release_id, fail } => {
                    self.orchestrator.cancel_release(&release_id, fail).await
                }
                Job::HealthCheck { task_service_id } => {
                    self.health.check(&task_service_id).await.map(|_| ())
                }
                Job::PollTask { task_id } => self.poller.poll_task(&task_id).await,
                Job::PollRelease { release_id } => self.poller.poll_release(&release_id).await,
            };

            if result.discard_illegal()?.is_none() {
                debug!("Job superseded by a concurrent transition");
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Schedule a health check for every registered task service.
    pub async fn sweep_health(&self) -> AppResult<usize> {
        let services = self.store.list_task_services(false).await?;
        for service in &services {
            self.queue
                .enqueue(Job::HealthCheck {
                    task_service_id: service.id.clone(),
                })
                .await?;
        }
        debug!(count = services.len(), "Health checks scheduled");
        Ok(services.len())
    }

    /// Schedule a status poll for every live task and release.
    pub async fn sweep_status(&self) -> AppResult<usize> {
        let tasks = self.store.list_tasks(&TaskFilter::active()).await?;
        let releases = self.store.list_releases(&ReleaseFilter::active()).await?;

        for task in &tasks {
            self.queue
                .enqueue(Job::PollTask {
                    task_id: task.id.clone(),
                })
                .await?;
        }
        for release in &releases {
            self.queue
                .enqueue(Job::PollRelease {
                    release_id: release.id.clone(),
                })
                .await?;
        }

        let count = tasks.len() + releases.len();
        debug!(tasks = tasks.len(), releases = releases.len(), "Status polls scheduled");
        Ok(count)
    }
}

#[async_trait]
impl JobHandler for Coordinator {
    async fn handle(&self, job: Job) -> AppResult<()> {
        self.execute(job).await
    }
}
