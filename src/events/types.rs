use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{Operation, OperationKind};

/// Stable identifier for an event kind, used by subscribers to dispatch
/// without inspecting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessEventKind {
    ProvisioningStepProcessed,
    DeprovisioningStepProcessed,
}

/// Immutable record of one step execution.
///
/// Created by the orchestrator after every step call, on success and failure
/// paths alike, and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct StepProcessed {
    pub step_name: String,
    /// Wall-clock duration of the step call.
    pub duration: Duration,
    /// Redrive delay the step requested; zero means "proceed now".
    pub when: Duration,
    /// Error text if the step returned an error.
    pub error: Option<String>,
    /// Operation snapshot before the step ran.
    pub old_operation: Operation,
    /// Operation snapshot after the step ran. Equals `old_operation` when the
    /// step errored before producing a new one.
    pub operation: Operation,
    pub published_at: DateTime<Utc>,
}

impl StepProcessed {
    pub fn kind(&self) -> ProcessEventKind {
        match self.operation.kind {
            OperationKind::Provisioning => ProcessEventKind::ProvisioningStepProcessed,
            OperationKind::Deprovisioning => ProcessEventKind::DeprovisioningStepProcessed,
        }
    }
}
