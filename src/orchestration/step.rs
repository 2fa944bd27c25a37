use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Operation;

/// A single named unit of work applied to an operation.
///
/// Steps are constructed once at process startup and registered into a weight
/// bucket on the [`StepManager`](super::StepManager). Every dispatch re-runs
/// the pipeline from the first bucket, so a step MUST detect work it has
/// already completed and return `(operation, Duration::ZERO)` immediately;
/// the engine has no guard against duplicate external side effects from a
/// step whose "already done" check is broken.
///
/// Return contract:
/// - `Ok((op, Duration::ZERO))` - work done (or already done), continue with
///   the next step
/// - `Ok((op, delay))` with `delay > 0` - suspend this dispatch; the queue
///   re-drives the operation after `delay`
/// - `Ok((op, _))` with a terminal `op.state` - the operation is finished;
///   no further step runs
/// - `Err(_)` - permanent failure of this dispatch; the queue drops the
///   operation without rescheduling
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, operation: Operation) -> Result<(Operation, Duration)>;
}
