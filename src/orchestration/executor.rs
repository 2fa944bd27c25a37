use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Contract between the work queue and whatever processes an operation.
///
/// `Ok(Duration::ZERO)` means the operation needs no further dispatch,
/// `Ok(delay)` asks the queue to re-drive it after `delay`, and `Err` is a
/// permanent failure the queue logs and drops.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(&self, operation_id: &str) -> Result<Duration>;
}
