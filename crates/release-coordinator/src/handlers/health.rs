//! Liveness endpoints of the coordinator itself.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Health status ("ok" or "unhealthy")
    pub status: String,
}

/// Detailed health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    /// Overall health status
    pub status: String,

    /// Entity store connectivity status
    pub store: String,

    /// Server uptime in seconds
    pub uptime_seconds: u64,

    /// Number of queue workers running jobs
    pub queue_workers: usize,

    /// Server version
    pub version: String,
}

/// Basic health check endpoint.
///
/// `GET /health`
///
/// Answers without touching the store, for load balancer checks.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Detailed health check endpoint.
///
/// `GET /api/health`
///
/// # Returns
///
/// - `200 OK` if the entity store is reachable
/// - `503 Service Unavailable` otherwise
pub async fn api_health(State(state): State<AppState>) -> (StatusCode, Json<ApiHealthResponse>) {
    let store_healthy = state.store.health_check().await;

    let (status, store, code) = if store_healthy {
        ("ok", "connected", StatusCode::OK)
    } else {
        ("unhealthy", "disconnected", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ApiHealthResponse {
        status: status.to_string(),
        store: store.to_string(),
        uptime_seconds: state.uptime_seconds(),
        queue_workers: state.config.queue_workers,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (code, Json(response))
}
