//! # Step Manager
//!
//! The orchestrator: loads an operation by ID, runs registered steps in
//! weight order, and decides whether the dispatch continues, suspends with a
//! redrive delay, or terminates.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{ProcessEventPublisher, StepProcessed};
use crate::models::{Operation, OperationState};
use crate::storage::OperationStorage;

use super::executor::OperationExecutor;
use super::step::Step;

/// Redrive delay applied when the operation cannot be loaded. A store read
/// failure is always transient, never a failure of the operation itself.
pub const STORE_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Weight of the reserved bucket for mandatory first steps.
const INIT_WEIGHT: i32 = 0;

/// Orchestrates one operation through the registered step pipeline.
///
/// Steps are grouped by weight; buckets run in ascending order and steps
/// within a bucket run in registration order. Registration happens during
/// single-threaded process startup, before the queue dispatches anything.
///
/// Every dispatch restarts from the first bucket: completed steps are
/// expected to detect their own work and fall through immediately, which
/// removes the need for persisted step-cursor state.
pub struct StepManager {
    storage: Arc<dyn OperationStorage>,
    publisher: ProcessEventPublisher,
    steps: BTreeMap<i32, Vec<Arc<dyn Step>>>,
}

impl StepManager {
    pub fn new(storage: Arc<dyn OperationStorage>, publisher: ProcessEventPublisher) -> Self {
        Self {
            storage,
            publisher,
            steps: BTreeMap::new(),
        }
    }

    /// Register a mandatory first step; the init bucket runs before all
    /// weighted buckets.
    pub fn init_step(&mut self, step: Arc<dyn Step>) {
        self.steps.entry(INIT_WEIGHT).or_default().push(step);
    }

    /// Register a step under the given weight. Weights at or below zero are
    /// normalized to 1; the init bucket is reserved for [`Self::init_step`].
    pub fn add_step(&mut self, weight: i32, step: Arc<dyn Step>) {
        let weight = if weight <= INIT_WEIGHT { 1 } else { weight };
        self.steps.entry(weight).or_default().push(step);
    }

    pub fn step_count(&self) -> usize {
        self.steps.values().map(Vec::len).sum()
    }

    fn publish_step_processed(
        &self,
        step_name: &str,
        duration: Duration,
        when: Duration,
        error: Option<String>,
        old_operation: Operation,
        operation: Operation,
    ) {
        let event = StepProcessed {
            step_name: step_name.to_string(),
            duration,
            when,
            error,
            old_operation,
            operation,
            published_at: Utc::now(),
        };
        if let Err(err) = self.publisher.publish(event) {
            warn!(step = step_name, error = %err, "Cannot publish step-processed event");
        }
    }
}

#[async_trait]
impl OperationExecutor for StepManager {
    async fn execute(&self, operation_id: &str) -> Result<Duration> {
        let mut operation = match self.storage.get(operation_id).await {
            Ok(operation) => operation,
            Err(err) => {
                warn!(
                    operation_id,
                    error = %err,
                    "Cannot fetch operation from storage, retrying shortly"
                );
                return Ok(STORE_RETRY_DELAY);
            }
        };

        if operation.state.is_terminal() {
            debug!(operation_id, state = %operation.state, "Operation already terminal, nothing to do");
            return Ok(Duration::ZERO);
        }
        if operation.state == OperationState::Pending {
            operation.state = OperationState::InProgress;
        }

        info!(operation_id, kind = %operation.kind, "🚀 Processing operation");

        for (weight, steps) in &self.steps {
            for step in steps {
                debug!(operation_id, step = step.name(), weight = *weight, "Starting step");
                let pre_step = operation.clone();
                let started = Instant::now();
                let result = step.run(operation).await;
                let duration = started.elapsed();

                match result {
                    Ok((post_step, when)) => {
                        self.publish_step_processed(
                            step.name(),
                            duration,
                            when,
                            None,
                            pre_step,
                            post_step.clone(),
                        );
                        operation = post_step;

                        if !operation.state.is_in_progress() {
                            info!(
                                operation_id,
                                step = step.name(),
                                state = %operation.state,
                                "Operation reached terminal state"
                            );
                            return Ok(Duration::ZERO);
                        }
                        if when > Duration::ZERO {
                            debug!(
                                operation_id,
                                step = step.name(),
                                redrive_secs = when.as_secs(),
                                "Step requested redrive, suspending this dispatch"
                            );
                            return Ok(when);
                        }
                    }
                    Err(err) => {
                        self.publish_step_processed(
                            step.name(),
                            duration,
                            Duration::ZERO,
                            Some(err.to_string()),
                            pre_step.clone(),
                            pre_step,
                        );
                        warn!(
                            operation_id,
                            step = step.name(),
                            error = %err,
                            "Step failed, dropping operation from processing"
                        );
                        return Err(err);
                    }
                }
            }
        }

        Ok(Duration::ZERO)
    }
}
