//! Database models for the Release Coordinator.
//!
//! Domain records are plain structs; where a column holds an enum the table
//! is read through a `*Row` struct and converted with `TryFrom`.

pub mod event;
pub mod release;
pub mod task;
pub mod task_service;

pub use event::*;
pub use release::*;
pub use task::*;
pub use task_service::*;
