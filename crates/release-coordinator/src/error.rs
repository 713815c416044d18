//! Error types for the Release Coordinator.
//!
//! Every fallible operation in the core returns [`AppResult`]. Dispatch
//! failures and illegal transitions are ordinary domain outcomes and are
//! recovered by the orchestrator; the remaining variants surface to the
//! caller (a queue worker or the binary) and are logged there.

use thiserror::Error;

use crate::engine::state::IllegalTransition;

/// Application-level errors for the coordinator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A transition was attempted from a state that does not allow it.
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    /// A worker could not be commanded (non-200, transport error or timeout).
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error only signals a transition race that a concurrent
    /// actor already resolved.
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, AppError::IllegalTransition(_))
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<envy::Error> for AppError {
    fn from(err: envy::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Dispatch(err.to_string())
    }
}
