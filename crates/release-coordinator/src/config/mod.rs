//! Configuration for the Release Coordinator.
//!
//! Both structs are loaded from environment variables with `envy`; a `.env`
//! file is read first by the binary.

mod app;
mod database;

pub use app::AppConfig;
pub use database::DatabaseConfig;
