//! Service layer for the Release Coordinator.
//!
//! Services talk to the outside world (task services over HTTP) and to the
//! event log; the engine composes them.

pub mod dispatcher;
pub mod event;
pub mod health;

pub use dispatcher::{Action, DispatchOutcome, Progress, TaskDispatcher, WorkerReport};
pub use event::EventLog;
pub use health::HealthMonitor;
