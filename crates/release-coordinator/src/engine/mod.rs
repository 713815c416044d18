//! Release coordination engine.
//!
//! - **State**: release and task transition tables
//! - **Orchestrator**: drives releases and tasks through their lifecycles
//! - **Poller**: pulls task status and enforces inactivity timeouts
//! - **Coordinator**: routes queued jobs and schedules periodic sweeps

pub mod coordinator;
pub mod orchestrator;
pub mod poller;
pub mod state;

pub use coordinator::Coordinator;
pub use orchestrator::ReleaseOrchestrator;
pub use poller::StatusPoller;
pub use state::{IllegalTransition, Lifecycle, ReleaseState, ReleaseTransition, TaskState, TaskTransition};
