//! Database queries for the Release Coordinator.
//!
//! Free functions taking a `&DbPool`, one module per table. State changes
//! go through compare-and-set updates that report whether a row was touched.

pub mod event;
pub mod release;
pub mod task;
pub mod task_service;
