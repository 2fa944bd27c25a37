//! In-process operation store backed by a concurrent map.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::models::Operation;

use super::{OperationStorage, StorageError};

/// DashMap-backed store with the same `updated_at` semantics the production
/// store provides: refreshed on successful update only.
#[derive(Debug, Default)]
pub struct InMemoryOperationStorage {
    operations: DashMap<String, Operation>,
}

impl InMemoryOperationStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[async_trait]
impl OperationStorage for InMemoryOperationStorage {
    async fn get(&self, operation_id: &str) -> Result<Operation, StorageError> {
        self.operations
            .get(operation_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(operation_id.to_string()))
    }

    async fn insert(&self, operation: Operation) -> Result<(), StorageError> {
        if self.operations.contains_key(&operation.id) {
            return Err(StorageError::AlreadyExists(operation.id));
        }
        self.operations.insert(operation.id.clone(), operation);
        Ok(())
    }

    async fn update(&self, mut operation: Operation) -> Result<Operation, StorageError> {
        if !self.operations.contains_key(&operation.id) {
            return Err(StorageError::NotFound(operation.id));
        }
        operation.updated_at = Utc::now();
        self.operations
            .insert(operation.id.clone(), operation.clone());
        Ok(operation)
    }
}
