//! Queue that holds jobs until they are drained explicitly.
//!
//! Used to run orchestration deterministically: enqueue, then [`LocalQueue::burst`]
//! executes jobs one at a time, including the ones they enqueue, until the
//! queue is empty.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Job, JobHandler, WorkQueue};
use crate::error::AppResult;
use crate::result_ext::ResultExt;

#[derive(Debug, Default)]
pub struct LocalQueue {
    jobs: Mutex<VecDeque<Job>>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Snapshot of the pending jobs in execution order.
    pub async fn pending(&self) -> Vec<Job> {
        self.jobs.lock().await.iter().cloned().collect()
    }

    pub async fn pop(&self) -> Option<Job> {
        self.jobs.lock().await.pop_front()
    }

    /// Execute jobs until none are left. Returns how many ran.
    pub async fn burst<H: JobHandler + ?Sized>(&self, handler: &H) -> usize {
        let mut executed = 0;
        while let Some(job) = self.pop().await {
            let name = job.to_string();
            let _ = handler.handle(job).await.log(format!("job {}", name));
            executed += 1;
        }
        executed
    }
}

#[async_trait]
impl WorkQueue for LocalQueue {
    async fn enqueue(&self, job: Job) -> AppResult<()> {
        self.jobs.lock().await.push_back(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Chain {
        queue: Arc<LocalQueue>,
    }

    #[async_trait]
    impl JobHandler for Chain {
        async fn handle(&self, job: Job) -> AppResult<()> {
            if let Job::InitRelease { release_id } = job {
                self.queue.enqueue(Job::StartRelease { release_id }).await?;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_burst_runs_follow_up_jobs() {
        let queue = Arc::new(LocalQueue::new());
        let chain = Chain {
            queue: queue.clone(),
        };
        queue
            .enqueue(Job::InitRelease {
                release_id: "RE_AAAAAAAA".into(),
            })
            .await
            .unwrap();

        assert_eq!(queue.burst(&chain).await, 2);
        assert!(queue.is_empty().await);
    }
}
