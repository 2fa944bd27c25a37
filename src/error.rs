use std::fmt;

/// Crate-wide error type for the orchestration core.
///
/// `OperationFailed` is the terminal business outcome of an operation: it is
/// produced when a failed state has been durably persisted and carries the
/// human-readable reason that was appended to the operation's description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    StorageError(String),
    StepError(String),
    OperationFailed(String),
    QueueError(String),
    ConfigurationError(String),
    EventError(String),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::StorageError(msg) => write!(f, "Storage error: {msg}"),
            BrokerError::StepError(msg) => write!(f, "Step error: {msg}"),
            BrokerError::OperationFailed(msg) => write!(f, "Operation failed: {msg}"),
            BrokerError::QueueError(msg) => write!(f, "Queue error: {msg}"),
            BrokerError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            BrokerError::EventError(msg) => write!(f, "Event error: {msg}"),
        }
    }
}

impl std::error::Error for BrokerError {}

pub type Result<T> = std::result::Result<T, BrokerError>;
