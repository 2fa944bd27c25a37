//! # Operation Manager
//!
//! Helpers steps use to mutate an operation's terminal and retry state and
//! persist it. Storage failures are infrastructure-transient: they are
//! converted into a fixed redrive delay and never consume the business-level
//! retry budget of the step that is persisting.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{BrokerError, Result};
use crate::models::{Operation, OperationState};
use crate::storage::OperationStorage;

/// Redrive delay applied when persisting an operation fails. The queue
/// re-dispatches the operation and the save is retried on the next pass.
pub const STORAGE_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Slack added on top of the retry interval by [`OperationManager::retry_operation_once`]
/// so the single allowed retry fits inside the budget.
const SINGLE_RETRY_SLACK: Duration = Duration::from_secs(1);

pub struct OperationManager {
    storage: Arc<dyn OperationStorage>,
}

impl OperationManager {
    pub fn new(storage: Arc<dyn OperationStorage>) -> Self {
        Self { storage }
    }

    /// Mark the operation succeeded and persist it.
    ///
    /// If the write fails, the original operation is returned unchanged with
    /// [`STORAGE_RETRY_DELAY`] so the queue re-drives it; the outcome is only
    /// durable once the write lands.
    pub async fn operation_succeeded(
        &self,
        operation: Operation,
        description: &str,
    ) -> Result<(Operation, Duration)> {
        let (operation, delay) = self
            .update_operation_state(operation, OperationState::Succeeded, description)
            .await;
        Ok((operation, delay))
    }

    /// Mark the operation failed and persist it.
    ///
    /// On a successful write this always returns an error carrying the
    /// description, which makes a step that calls it propagate a permanent
    /// failure out of the current dispatch. A failed write is retried like
    /// any other storage failure.
    pub async fn operation_failed(
        &self,
        operation: Operation,
        description: &str,
    ) -> Result<(Operation, Duration)> {
        let (operation, delay) = self
            .update_operation_state(operation, OperationState::Failed, description)
            .await;
        if delay.is_zero() {
            return Err(BrokerError::OperationFailed(description.to_string()));
        }
        Ok((operation, delay))
    }

    /// Persist a non-terminal change (e.g. an externally obtained identifier
    /// saved onto the operation).
    pub async fn update_operation(&self, operation: Operation) -> (Operation, Duration) {
        match self.storage.update(operation.clone()).await {
            Ok(stored) => (stored, Duration::ZERO),
            Err(err) => {
                warn!(
                    operation_id = %operation.id,
                    error = %err,
                    "Cannot persist operation, retrying the save"
                );
                (operation, STORAGE_RETRY_DELAY)
            }
        }
    }

    /// Retry with a budget of exactly one retry interval.
    pub async fn retry_operation_once(
        &self,
        operation: Operation,
        message: &str,
        wait: Duration,
    ) -> Result<(Operation, Duration)> {
        self.retry_operation(operation, message, wait, wait + SINGLE_RETRY_SLACK)
            .await
    }

    /// Keep re-driving the operation every `retry_interval` until the elapsed
    /// time since its last persisted write exceeds `max_time`, then fail it
    /// permanently.
    ///
    /// The decision is read-only: `updated_at` is not refreshed, so the
    /// elapsed time keeps advancing across repeated queue redeliveries.
    pub async fn retry_operation(
        &self,
        operation: Operation,
        message: &str,
        retry_interval: Duration,
        max_time: Duration,
    ) -> Result<(Operation, Duration)> {
        let since_update = elapsed_since_update(&operation);
        info!(
            operation_id = %operation.id,
            elapsed_secs = since_update.as_secs(),
            budget_secs = max_time.as_secs(),
            "Retrying operation: {message}"
        );
        if since_update < max_time {
            return Ok((operation, retry_interval));
        }
        warn!(
            operation_id = %operation.id,
            "Retry budget exhausted, failing operation: {message}"
        );
        self.operation_failed(operation, message).await
    }

    /// Same budget check as [`retry_operation`], but exhaustion gives up
    /// silently instead of failing the operation. Used by best-effort steps
    /// where continuing the pipeline beats a hard failure.
    pub async fn retry_operation_without_fail(
        &self,
        operation: Operation,
        message: &str,
        retry_interval: Duration,
        max_time: Duration,
    ) -> Result<(Operation, Duration)> {
        let since_update = elapsed_since_update(&operation);
        if since_update < max_time {
            return Ok((operation, retry_interval));
        }
        warn!(
            operation_id = %operation.id,
            "Retry budget exhausted, giving up without failing the operation: {message}"
        );
        Ok((operation, Duration::ZERO))
    }

    async fn update_operation_state(
        &self,
        operation: Operation,
        state: OperationState,
        description: &str,
    ) -> (Operation, Duration) {
        let mut updated = operation.clone();
        updated.state = state;
        updated.append_description(description);

        match self.storage.update(updated).await {
            Ok(stored) => {
                info!(
                    operation_id = %stored.id,
                    state = %stored.state,
                    "Operation reached state: {description}"
                );
                (stored, Duration::ZERO)
            }
            Err(err) => {
                warn!(
                    operation_id = %operation.id,
                    error = %err,
                    "Cannot persist operation state, retrying the save"
                );
                (operation, STORAGE_RETRY_DELAY)
            }
        }
    }
}

fn elapsed_since_update(operation: &Operation) -> Duration {
    (Utc::now() - operation.updated_at)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryOperationStorage, StorageError};
    use async_trait::async_trait;
    use serde_json::json;

    /// Storage stub whose writes always fail.
    struct BrokenStorage;

    #[async_trait]
    impl OperationStorage for BrokenStorage {
        async fn get(&self, operation_id: &str) -> std::result::Result<Operation, StorageError> {
            Err(StorageError::Backend(format!(
                "connection refused while loading {operation_id}"
            )))
        }

        async fn insert(&self, _operation: Operation) -> std::result::Result<(), StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }

        async fn update(
            &self,
            _operation: Operation,
        ) -> std::result::Result<Operation, StorageError> {
            Err(StorageError::Backend("connection refused".into()))
        }
    }

    async fn stored_operation(storage: &InMemoryOperationStorage) -> Operation {
        let mut op = Operation::new_provisioning("instance-1", json!({}));
        op.state = OperationState::InProgress;
        storage.insert(op.clone()).await.unwrap();
        op
    }

    #[tokio::test]
    async fn operation_succeeded_persists_terminal_state() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let op = stored_operation(&storage).await;

        let (op, delay) = manager
            .operation_succeeded(op, "runtime created")
            .await
            .unwrap();

        assert_eq!(op.state, OperationState::Succeeded);
        assert_eq!(op.description, "runtime created");
        assert!(delay.is_zero());
        let stored = storage.get(&op.id).await.unwrap();
        assert_eq!(stored.state, OperationState::Succeeded);
    }

    #[tokio::test]
    async fn operation_succeeded_retries_failed_save() {
        let manager = OperationManager::new(Arc::new(BrokenStorage));
        let mut op = Operation::new_provisioning("instance-1", json!({}));
        op.state = OperationState::InProgress;

        let (returned, delay) = manager
            .operation_succeeded(op.clone(), "runtime created")
            .await
            .unwrap();

        // Original operation comes back untouched, outcome is not durable yet
        assert_eq!(returned, op);
        assert_eq!(delay, STORAGE_RETRY_DELAY);
    }

    #[tokio::test]
    async fn operation_failed_returns_error_once_persisted() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let op = stored_operation(&storage).await;
        let id = op.id.clone();

        let err = manager
            .operation_failed(op, "invalid provider parameters")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BrokerError::OperationFailed("invalid provider parameters".to_string())
        );
        let stored = storage.get(&id).await.unwrap();
        assert_eq!(stored.state, OperationState::Failed);
        assert_eq!(stored.description, "invalid provider parameters");
    }

    #[tokio::test]
    async fn operation_failed_retries_failed_save() {
        let manager = OperationManager::new(Arc::new(BrokenStorage));
        let mut op = Operation::new_provisioning("instance-1", json!({}));
        op.state = OperationState::InProgress;

        let (returned, delay) = manager
            .operation_failed(op.clone(), "invalid provider parameters")
            .await
            .unwrap();

        assert_eq!(returned.state, OperationState::InProgress);
        assert_eq!(delay, STORAGE_RETRY_DELAY);
    }

    #[tokio::test]
    async fn retry_within_budget_requests_redrive() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let op = stored_operation(&storage).await;

        let (op, delay) = manager
            .retry_operation(
                op,
                "provisioner still busy",
                Duration::from_secs(3600),
                Duration::from_secs(3 * 3600),
            )
            .await
            .unwrap();

        assert!(delay > Duration::ZERO);
        assert_eq!(op.state, OperationState::InProgress);
    }

    #[tokio::test]
    async fn retry_decision_is_repeatable_without_persisting() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let op = stored_operation(&storage).await;
        let updated_at = op.updated_at;

        // A pure retry decision never refreshes updated_at, so repeating it
        // yields the same answer every time
        for _ in 0..3 {
            let (op2, delay) = manager
                .retry_operation(
                    op.clone(),
                    "provisioner still busy",
                    Duration::from_secs(60),
                    Duration::from_secs(3600),
                )
                .await
                .unwrap();
            assert_eq!(delay, Duration::from_secs(60));
            assert_eq!(op2.updated_at, updated_at);
        }
    }

    #[tokio::test]
    async fn second_retry_still_within_budget() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let mut op = stored_operation(&storage).await;

        let (op2, when) = manager
            .retry_operation(
                op.clone(),
                "provisioner still busy",
                Duration::from_secs(3600),
                Duration::from_secs(3 * 3600),
            )
            .await
            .unwrap();
        assert!(when > Duration::ZERO);

        // Simulate one retry interval (plus a second) having elapsed
        op.updated_at = op2.updated_at - chrono::Duration::seconds(3601);
        let (_, when) = manager
            .retry_operation(
                op,
                "provisioner still busy",
                Duration::from_secs(3600),
                Duration::from_secs(3 * 3600),
            )
            .await
            .unwrap();
        assert!(when > Duration::ZERO);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_fails_operation() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let mut op = stored_operation(&storage).await;
        let id = op.id.clone();
        op.updated_at = Utc::now() - chrono::Duration::hours(4);

        let err = manager
            .retry_operation(
                op,
                "provisioner still busy",
                Duration::from_secs(3600),
                Duration::from_secs(3 * 3600),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::OperationFailed(_)));
        let stored = storage.get(&id).await.unwrap();
        assert_eq!(stored.state, OperationState::Failed);
    }

    #[tokio::test]
    async fn exhausted_budget_without_fail_gives_up_silently() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let mut op = stored_operation(&storage).await;
        op.updated_at = Utc::now() - chrono::Duration::hours(4);

        let (op, delay) = manager
            .retry_operation_without_fail(
                op,
                "backup tenant cleanup still pending",
                Duration::from_secs(3600),
                Duration::from_secs(3 * 3600),
            )
            .await
            .unwrap();

        assert!(delay.is_zero());
        assert_eq!(op.state, OperationState::InProgress);
    }

    #[tokio::test]
    async fn retry_once_budget_is_one_interval() {
        let storage = Arc::new(InMemoryOperationStorage::new());
        let manager = OperationManager::new(storage.clone());
        let op = stored_operation(&storage).await;
        let id = op.id.clone();

        let (op, delay) = manager
            .retry_operation_once(op, "certificate not ready", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(delay, Duration::from_secs(30));

        // Past one interval the budget is spent
        let mut op = op;
        op.updated_at = Utc::now() - chrono::Duration::seconds(32);
        let err = manager
            .retry_operation_once(op, "certificate not ready", Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::OperationFailed(_)));
        let stored = storage.get(&id).await.unwrap();
        assert_eq!(stored.state, OperationState::Failed);
    }
}
