//! # Data Model
//!
//! Durable records driven by the orchestration engine. The only entity the
//! engine itself reads and writes is the [`Operation`].

pub mod operation;

pub use operation::{
    BackupData, EventingData, MonitoringData, Operation, OperationKind, OperationState,
};
