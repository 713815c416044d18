//! In-process queue backed by a tokio channel.
//!
//! Several workers share one receiver; each takes the next job as soon as it
//! is free, so jobs of the same release may run concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::{Job, JobHandler, WorkQueue};
use crate::error::{AppError, AppResult};
use crate::result_ext::ResultExt;

/// Receiving half shared by the workers.
pub type JobReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Sending half of the in-process queue.
#[derive(Clone)]
pub struct ChannelQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl ChannelQueue {
    pub fn new() -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }
}

#[async_trait]
impl WorkQueue for ChannelQueue {
    async fn enqueue(&self, job: Job) -> AppResult<()> {
        tracing::debug!(job = %job, "Enqueueing job");
        self.sender
            .send(job)
            .map_err(|e| AppError::Internal(format!("job queue is closed, dropped {}", e.0)))
    }
}

/// Spawn `count` workers that execute jobs until `shutdown` flips to true
/// or the queue closes.
///
/// A failed job is logged and dropped; the worker keeps running.
pub fn spawn_workers<H>(
    count: usize,
    receiver: JobReceiver,
    handler: Arc<H>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>>
where
    H: JobHandler + 'static,
{
    (0..count.max(1))
        .map(|worker| {
            let receiver = receiver.clone();
            let handler = handler.clone();
            let mut shutdown = shutdown.clone();

            tokio::spawn(async move {
                tracing::debug!(worker, "Queue worker started");
                loop {
                    let job = tokio::select! {
                        _ = shutdown.changed() => break,
                        job = async { receiver.lock().await.recv().await } => job,
                    };
                    let Some(job) = job else { break };

                    let name = job.to_string();
                    let _ = handler.handle(job).await.log(format!("job {}", name));
                }
                tracing::debug!(worker, "Queue worker stopped");
            })
        })
        .collect()
}
