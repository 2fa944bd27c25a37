//! # Operation Store Boundary
//!
//! The engine persists operations through [`OperationStorage`] and treats any
//! storage failure as infrastructure-transient. The production implementation
//! lives outside this crate; [`InMemoryOperationStorage`] backs tests and
//! local runs.

pub mod memory;

use async_trait::async_trait;

use crate::models::Operation;

pub use memory::InMemoryOperationStorage;

/// Error types for operation persistence
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("operation {0} not found")]
    NotFound(String),
    #[error("operation {0} already exists")]
    AlreadyExists(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Key-value persistence for operations, keyed by operation ID.
///
/// Updates are last-writer-wins overwrites of the full record; the queue's
/// per-ID deduplication is what prevents concurrent writers. A successful
/// `update` is the only place `updated_at` is refreshed.
#[async_trait]
pub trait OperationStorage: Send + Sync {
    async fn get(&self, operation_id: &str) -> Result<Operation, StorageError>;

    async fn insert(&self, operation: Operation) -> Result<(), StorageError>;

    /// Overwrite the stored record and refresh its `updated_at`. Returns the
    /// operation as persisted.
    async fn update(&self, operation: Operation) -> Result<Operation, StorageError>;
}
