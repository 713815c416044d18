//! HTTP handlers for the coordinator's own endpoints.

pub mod health;

pub use health::{api_health, health_check};
