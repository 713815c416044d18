//! Task service health monitor.
//!
//! Pings `GET {url}/status` and keeps a rolling count of consecutive
//! failures on the task service record. A service is never disabled here;
//! the count only feeds the derived health status.

use std::sync::Arc;
use std::time::Duration;

use crate::db::models::{HealthStatus, TaskService, MAX_FAILED_CHECKS};
use crate::error::{AppError, AppResult};
use crate::services::event::EventLog;
use crate::store::Store;

#[derive(Clone)]
pub struct HealthMonitor {
    store: Arc<dyn Store>,
    events: EventLog,
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthMonitor {
    pub fn new(store: Arc<dyn Store>, events: EventLog, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            store,
            events,
            client,
            timeout,
        })
    }

    /// Whether the service answers its status endpoint with a success code.
    pub async fn ping(&self, service: &TaskService) -> bool {
        let url = format!("{}/status", service.url.trim_end_matches('/'));
        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    task_service_id = %service.id,
                    status = response.status().as_u16(),
                    "Health check returned non-success status"
                );
                false
            }
            Err(e) => {
                tracing::debug!(task_service_id = %service.id, error = %e, "Health check failed");
                false
            }
        }
    }

    /// Check one service and record the result. Returns the resulting health.
    pub async fn check(&self, task_service_id: &str) -> AppResult<HealthStatus> {
        let service = self
            .store
            .get_task_service(task_service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task service {}", task_service_id)))?;

        let healthy = self.ping(&service).await;
        let streak = self
            .store
            .record_health(&service.id, healthy)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task service {}", task_service_id)))?;

        if streak == MAX_FAILED_CHECKS + 1 {
            tracing::warn!(task_service_id = %service.id, streak, "Task service is down");
            self.events
                .service_warning(
                    &service.id,
                    format!(
                        "task service {} is down after {} failed health checks",
                        service.id, streak
                    ),
                )
                .await?;
        } else if healthy && service.health_status() == HealthStatus::Down {
            tracing::info!(task_service_id = %service.id, "Task service recovered");
        }

        Ok(HealthStatus::from_streak(streak))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{EventFilter, EventType, NewTaskService};
    use crate::store::MemoryStore;
    use mockito::Server;

    async fn monitor_for(url: &str) -> (Arc<MemoryStore>, HealthMonitor, String) {
        let store = Arc::new(MemoryStore::new());
        let service = TaskService::from_request(NewTaskService::new("ds", url));
        store.create_task_service(&service).await.unwrap();
        let monitor = HealthMonitor::new(
            store.clone(),
            EventLog::new(store.clone()),
            Duration::from_secs(2),
        )
        .unwrap();
        (store, monitor, service.id)
    }

    #[tokio::test]
    async fn test_goes_down_on_fourth_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .with_status(503)
            .expect(4)
            .create_async()
            .await;
        let (store, monitor, id) = monitor_for(&server.url()).await;

        for _ in 0..3 {
            assert_eq!(monitor.check(&id).await.unwrap(), HealthStatus::Ok);
        }
        assert_eq!(monitor.check(&id).await.unwrap(), HealthStatus::Down);
        mock.assert_async().await;

        let service = store.get_task_service(&id).await.unwrap().unwrap();
        assert_eq!(service.last_ok_status, 4);
        assert!(service.enabled);

        let warnings = store
            .list_events(&EventFilter {
                task_service_id: Some(id.clone()),
                event_type: Some(EventType::Warning),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_success_resets_streak() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/status")
            .with_status(200)
            .create_async()
            .await;
        let (store, monitor, id) = monitor_for(&server.url()).await;
        store.record_health(&id, false).await.unwrap();
        store.record_health(&id, false).await.unwrap();

        assert_eq!(monitor.check(&id).await.unwrap(), HealthStatus::Ok);
        let service = store.get_task_service(&id).await.unwrap().unwrap();
        assert_eq!(service.last_ok_status, 0);
    }

    #[tokio::test]
    async fn test_silent_service_counts_as_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let store = Arc::new(MemoryStore::new());
        let service = TaskService::from_request(NewTaskService::new("slow", &url));
        store.create_task_service(&service).await.unwrap();
        let monitor = HealthMonitor::new(
            store.clone(),
            EventLog::new(store.clone()),
            Duration::from_millis(200),
        )
        .unwrap();

        assert!(!monitor.ping(&service).await);
        monitor.check(&service.id).await.unwrap();
        let stored = store.get_task_service(&service.id).await.unwrap().unwrap();
        assert_eq!(stored.last_ok_status, 1);
    }

    #[tokio::test]
    async fn test_unknown_service() {
        let (_, monitor, _) = monitor_for("http://127.0.0.1:1").await;
        assert!(matches!(
            monitor.check("TS_MISSING0").await,
            Err(AppError::NotFound(_))
        ));
    }
}
