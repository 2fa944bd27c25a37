//! # Operation Model
//!
//! The unit of durable state for one provisioning or deprovisioning request.
//! An operation is created once, then repeatedly re-dispatched through the
//! step pipeline until it reaches a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle state of an operation.
///
/// Allowed transitions: `Pending`/`InProgress` -> `InProgress` ->
/// `Succeeded` | `Failed`. Once terminal, no further step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, OperationState::InProgress)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationState::Pending => "pending",
            OperationState::InProgress => "in progress",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// The two operation variants share the same shape; the engine never branches
/// on the kind, it only tags emitted events with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Provisioning,
    Deprovisioning,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationKind::Provisioning => "provisioning",
            OperationKind::Deprovisioning => "deprovisioning",
        };
        write!(f, "{s}")
    }
}

/// Monitoring-system registration bookkeeping carried on the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringData {
    pub evaluation_id: Option<String>,
    pub tenant_registered: bool,
}

/// Backup-system tenant bookkeeping carried on the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupData {
    pub tenant_id: Option<String>,
    pub requested_at: Option<DateTime<Utc>>,
}

/// Eventing-infrastructure bookkeeping carried on the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventingData {
    pub resource_group: Option<String>,
    pub deleted: bool,
}

/// Persisted record of one provisioning or deprovisioning request.
///
/// `updated_at` is refreshed only by a successful persisted write (see
/// [`crate::storage::OperationStorage::update`]); read-only retry decisions
/// leave it untouched so elapsed-time retry budgets keep advancing across
/// queue redeliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub instance_id: String,
    pub kind: OperationKind,
    pub state: OperationState,
    /// Append-only audit trail of step outcomes.
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Serialized request parameters as received from the tenant.
    pub provisioning_parameters: Value,
    /// Identifier assigned by the downstream provisioner, once known.
    pub provisioner_operation_id: Option<String>,
    /// Identifier of the runtime cluster this operation targets, once known.
    pub runtime_id: Option<String>,

    pub monitoring: MonitoringData,
    pub backup: BackupData,
    pub eventing: EventingData,
}

impl Operation {
    pub fn new_provisioning(instance_id: impl Into<String>, parameters: Value) -> Self {
        Self::new(OperationKind::Provisioning, instance_id.into(), parameters)
    }

    pub fn new_deprovisioning(instance_id: impl Into<String>) -> Self {
        Self::new(
            OperationKind::Deprovisioning,
            instance_id.into(),
            Value::Null,
        )
    }

    fn new(kind: OperationKind, instance_id: String, parameters: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            instance_id,
            kind,
            state: OperationState::Pending,
            description: String::new(),
            created_at: now,
            updated_at: now,
            provisioning_parameters: parameters,
            provisioner_operation_id: None,
            runtime_id: None,
            monitoring: MonitoringData::default(),
            backup: BackupData::default(),
            eventing: EventingData::default(),
        }
    }

    /// Append a segment to the audit trail. Prior segments are never erased.
    pub fn append_description(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(segment);
    }
}
