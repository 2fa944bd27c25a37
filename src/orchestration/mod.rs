//! # Orchestration Engine
//!
//! Generic step-based engine driving persisted long-running operations to a
//! terminal state.
//!
//! ## Core Components
//!
//! - **StepManager**: loads an operation, runs registered steps in weight
//!   order, decides continue/suspend/terminate, and emits a step-processed
//!   event after every step call
//! - **OperationManager**: helpers steps use to persist terminal and retry
//!   state, separating infrastructure-transient storage failures from
//!   business-level retry budgets
//! - **OperationQueue**: deduplicating FIFO of operation IDs serviced by a
//!   fixed pool of workers that re-drive operations based on the delay the
//!   executor hands back
//! - **Step / OperationExecutor**: the contracts collaborators implement and
//!   the queue drives
//!
//! Steps are registered during a single-threaded initialization phase, before
//! the queue starts; the engine itself never sleeps, all waiting is expressed
//! as redrive delays handed back to the queue.

pub mod executor;
pub mod manager;
pub mod operation_manager;
pub mod queue;
pub mod step;

pub use executor::OperationExecutor;
pub use manager::{StepManager, STORE_RETRY_DELAY};
pub use operation_manager::{OperationManager, STORAGE_RETRY_DELAY};
pub use queue::OperationQueue;
pub use step::Step;
