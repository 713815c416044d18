//! Release Coordinator Library
//!
//! Drives data releases through a set of external task services:
//!
//! - **Orchestration**: initialize, start, stage and publish a release by
//!   commanding one task per enabled task service
//! - **Escalation**: any task failure cancels the whole release
//! - **Polling**: pull task status and cancel idle tasks and releases
//! - **Health**: track consecutive failed liveness checks per task service
//!
//! ## Architecture
//!
//! Every orchestration step is a [`queue::Job`]; each job handler enqueues
//! its own follow-up. The [`store::Store`] is the single source of truth and
//! all state changes are compare-and-set writes guarded by the transition
//! tables in [`engine::state`], each followed by one [`db::models::Event`].
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`db`]: PostgreSQL models, queries and schema
//! - [`store`]: Persistence contract with PostgreSQL and in-memory backends
//! - [`queue`]: Job values, queue contract and workers
//! - [`services`]: Task dispatcher, event log and health monitor
//! - [`engine`]: State machines, orchestrator, poller and job routing
//! - [`handlers`]: Liveness endpoints
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use release_coordinator::{
//!     config::AppConfig,
//!     engine::Coordinator,
//!     queue::LocalQueue,
//!     store::MemoryStore,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! let queue = Arc::new(LocalQueue::new());
//! let coordinator = Coordinator::new(store, queue.clone(), &AppConfig::default())?;
//! // ... create a release, then drain the queue
//! queue.burst(&coordinator).await;
//! ```

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod queue;
pub mod result_ext;
pub mod services;
pub mod state;
pub mod store;

pub use error::{AppError, AppResult};
pub use result_ext::{ResultExt, TransitionResultExt};
