#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Runtime Broker Core
//!
//! Step-based orchestration core for provisioning and deprovisioning managed
//! runtime clusters on behalf of tenants.
//!
//! ## Overview
//!
//! Each provisioning or deprovisioning request is persisted as an
//! [`Operation`](models::Operation) and driven through an ordered set of
//! pluggable [`Step`](orchestration::Step)s that call out to external systems
//! (credential lookup, cluster creation, monitoring/backup registration,
//! certificate issuance, tenant bookkeeping). Those calls take minutes to
//! hours and must survive process restarts, partial failures, and transient
//! outages, so the engine never blocks: every wait is expressed as a redrive
//! delay handed back to a deduplicating work queue.
//!
//! ## Module Organization
//!
//! - [`models`] - The durable `Operation` record
//! - [`storage`] - Operation store boundary and in-memory implementation
//! - [`orchestration`] - Step manager, operation manager, work queue
//! - [`events`] - Step-processed event bus
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use runtime_broker::{
//!     BrokerConfig, OperationQueue, ProcessEventPublisher, StepManager,
//!     storage::InMemoryOperationStorage,
//! };
//!
//! # fn steps() -> Vec<Arc<dyn runtime_broker::Step>> { Vec::new() }
//! # async fn example() {
//! let config = BrokerConfig::default();
//! let storage = Arc::new(InMemoryOperationStorage::new());
//! let publisher = ProcessEventPublisher::new(config.event_channel_capacity);
//!
//! let mut manager = StepManager::new(storage, publisher);
//! for step in steps() {
//!     manager.add_step(1, step);
//! }
//!
//! let queue = OperationQueue::new(Arc::new(manager), config.worker_count);
//! let workers = queue.run();
//! queue.add("operation-id");
//! # let _ = workers;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod storage;

pub use config::BrokerConfig;
pub use error::{BrokerError, Result};
pub use events::{ProcessEventKind, ProcessEventPublisher, StepProcessed};
pub use models::{Operation, OperationKind, OperationState};
pub use orchestration::{
    OperationExecutor, OperationManager, OperationQueue, Step, StepManager, STORAGE_RETRY_DELAY,
};
pub use storage::{InMemoryOperationStorage, OperationStorage, StorageError};
