//! Database module for the Release Coordinator.
//!
//! This module provides PostgreSQL connectivity, models and queries using
//! SQLx. The schema lives in the crate's `migrations/` directory.

pub mod models;
pub mod pool;
pub mod queries;

pub use pool::{create_pool, DbPool};

use crate::error::AppResult;

/// Apply pending schema migrations.
pub async fn init_schema(pool: &DbPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}
