//! Shared state for the coordinator's own HTTP endpoints.

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::store::Store;

/// Shared application state.
///
/// Cloned into every handler by Axum; all members are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Entity store the coordinator runs against
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            config,
            start_time: Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
