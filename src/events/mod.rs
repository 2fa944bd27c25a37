//! # Event System
//!
//! Step-processed events emitted by the orchestrator after every step
//! execution, consumed by metrics and observability collaborators. The bus is
//! an explicitly constructed publisher handed to the orchestrator by
//! reference; there is no global registry.

pub mod publisher;
pub mod types;

pub use publisher::{ProcessEventPublisher, PublishError};
pub use types::{ProcessEventKind, StepProcessed};
