//! Task dispatcher.
//!
//! Sends one command to one task service and classifies the outcome. There
//! is no retry: a rejected or unreachable command is final and the caller
//! escalates.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::db::models::Task;
use crate::engine::state::TaskState;
use crate::error::AppResult;

/// Command understood by task services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Initialize,
    Start,
    Publish,
    Cancel,
    GetStatus,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Initialize => "initialize",
            Action::Start => "start",
            Action::Publish => "publish",
            Action::Cancel => "cancel",
            Action::GetStatus => "get_status",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST {url}/tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskCommand<'a> {
    pub action: Action,
    pub task_id: &'a str,
    pub release_id: &'a str,
    pub studies: &'a [String],
}

/// Progress as reported by a task service: either a number or a string such
/// as `"50%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Progress {
    Number(f64),
    Text(String),
}

impl Progress {
    /// Percent complete clamped to 0..=100, or `None` if unparseable.
    pub fn percent(&self) -> Option<i32> {
        let value = match self {
            Progress::Number(n) => *n,
            Progress::Text(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        };
        if !value.is_finite() {
            return None;
        }
        Some(value.round().clamp(0.0, 100.0) as i32)
    }
}

/// State and progress a task service reports about a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub progress: Option<Progress>,
}

impl WorkerReport {
    pub fn with_state(state: TaskState) -> Self {
        Self {
            state: Some(state.as_str().to_string()),
            progress: None,
        }
    }

    /// The reported state if it names a known task state.
    pub fn task_state(&self) -> Option<TaskState> {
        self.state.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// HTTP 200, with the parsed body if it carried a report.
    Accepted(Option<WorkerReport>),
    /// Any other status.
    Rejected { status: u16 },
    /// Transport error or timeout.
    Unreachable(String),
}

impl DispatchOutcome {
    /// Why the command counts as failed, if it does.
    ///
    /// When `expected` is given, an accepted response that reports a
    /// different state is a failure too; a response without a state is not.
    pub fn failure(&self, expected: Option<TaskState>) -> Option<String> {
        match self {
            DispatchOutcome::Accepted(report) => {
                let reported = report.as_ref().and_then(|r| r.state.as_deref());
                match (expected, reported) {
                    (Some(want), Some(got)) if got != want.as_str() => Some(format!(
                        "task service reported state {} instead of {}",
                        got, want
                    )),
                    _ => None,
                }
            }
            DispatchOutcome::Rejected { status } => {
                Some(format!("task service responded with status {}", status))
            }
            DispatchOutcome::Unreachable(reason) => Some(reason.clone()),
        }
    }

    pub fn into_report(self) -> Option<WorkerReport> {
        match self {
            DispatchOutcome::Accepted(report) => report,
            _ => None,
        }
    }
}

/// HTTP client for task service commands.
#[derive(Clone)]
pub struct TaskDispatcher {
    client: reqwest::Client,
    timeout: Duration,
    token: Option<String>,
}

impl TaskDispatcher {
    /// Create a dispatcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration, token: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            timeout,
            token,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `action` for `task` to the service at `service_url`.
    pub async fn send(
        &self,
        action: Action,
        task: &Task,
        service_url: &str,
        studies: &[String],
    ) -> DispatchOutcome {
        let command = TaskCommand {
            action,
            task_id: &task.id,
            release_id: &task.release_id,
            studies,
        };
        let url = format!("{}/tasks", service_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).timeout(self.timeout).json(&command);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    action = %action,
                    url = %url,
                    error = %e,
                    "Task service unreachable"
                );
                return DispatchOutcome::Unreachable(e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                task_id = %task.id,
                action = %action,
                status = status.as_u16(),
                "Task service rejected command"
            );
            return DispatchOutcome::Rejected {
                status: status.as_u16(),
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return DispatchOutcome::Unreachable(e.to_string()),
        };

        let report = if body.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<WorkerReport>(&body) {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::debug!(task_id = %task.id, error = %e, "Ignoring non-JSON response body");
                    None
                }
            }
        };

        tracing::debug!(task_id = %task.id, action = %action, ?report, "Command accepted");
        DispatchOutcome::Accepted(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn task() -> Task {
        Task::new("RE_AAAAAAAA", "TS_AAAAAAAA")
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress::Text("50%".into()).percent(), Some(50));
        assert_eq!(Progress::Text(" 75 ".into()).percent(), Some(75));
        assert_eq!(Progress::Number(42.0).percent(), Some(42));
        assert_eq!(Progress::Number(250.0).percent(), Some(100));
        assert_eq!(Progress::Text("-3%".into()).percent(), Some(0));
        assert_eq!(Progress::Text("halfway".into()).percent(), None);
    }

    #[test]
    fn test_report_deserializes_mixed_progress() {
        let report: WorkerReport =
            serde_json::from_str(r#"{"state": "running", "progress": "30%"}"#).unwrap();
        assert_eq!(report.task_state(), Some(TaskState::Running));
        assert_eq!(report.progress.and_then(|p| p.percent()), Some(30));

        let report: WorkerReport = serde_json::from_str(r#"{"progress": 10}"#).unwrap();
        assert!(report.state.is_none());
    }

    #[test]
    fn test_failure_classification() {
        let running = DispatchOutcome::Accepted(Some(WorkerReport::with_state(TaskState::Running)));
        assert!(running.failure(Some(TaskState::Running)).is_none());
        assert!(running.failure(Some(TaskState::Publishing)).is_some());
        assert!(DispatchOutcome::Accepted(None)
            .failure(Some(TaskState::Running))
            .is_none());
        assert_eq!(
            DispatchOutcome::Rejected { status: 500 }.failure(None),
            Some("task service responded with status 500".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_posts_command() {
        let mut server = Server::new_async().await;
        let task = task();
        let mock = server
            .mock("POST", "/tasks")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(serde_json::json!({
                "action": "initialize",
                "task_id": task.id,
                "release_id": "RE_AAAAAAAA",
                "studies": ["SD_AAAAAAAA"],
            })))
            .with_status(200)
            .with_body(r#"{"state": "initialized", "progress": 0}"#)
            .create_async()
            .await;

        let dispatcher = TaskDispatcher::new(Duration::from_secs(5), Some("secret".into())).unwrap();
        let outcome = dispatcher
            .send(
                Action::Initialize,
                &task,
                &server.url(),
                &["SD_AAAAAAAA".to_string()],
            )
            .await;

        mock.assert_async().await;
        let report = outcome.into_report().unwrap();
        assert_eq!(report.task_state(), Some(TaskState::Initialized));
    }

    #[tokio::test]
    async fn test_send_classifies_status_and_body() {
        let mut server = Server::new_async().await;
        let dispatcher = TaskDispatcher::new(Duration::from_secs(5), None).unwrap();

        let rejected = server
            .mock("POST", "/tasks")
            .match_body(Matcher::PartialJson(serde_json::json!({"action": "start"})))
            .with_status(400)
            .create_async()
            .await;
        let empty = server
            .mock("POST", "/tasks")
            .match_body(Matcher::PartialJson(serde_json::json!({"action": "cancel"})))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let task = task();
        assert_eq!(
            dispatcher.send(Action::Start, &task, &server.url(), &[]).await,
            DispatchOutcome::Rejected { status: 400 }
        );
        assert_eq!(
            dispatcher.send(Action::Cancel, &task, &server.url(), &[]).await,
            DispatchOutcome::Accepted(None)
        );

        rejected.assert_async().await;
        empty.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_gives_up_on_silent_service() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let _held = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let dispatcher = TaskDispatcher::new(Duration::from_millis(200), None).unwrap();
        assert_eq!(dispatcher.timeout(), Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = dispatcher.send(Action::Start, &task(), &url, &[]).await;
        assert!(matches!(outcome, DispatchOutcome::Unreachable(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_send_unreachable() {
        let dispatcher = TaskDispatcher::new(Duration::from_millis(500), None).unwrap();
        let outcome = dispatcher
            .send(Action::GetStatus, &task(), "http://127.0.0.1:1", &[])
            .await;
        assert!(matches!(outcome, DispatchOutcome::Unreachable(_)));
    }
}
