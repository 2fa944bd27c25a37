use crate::error::{BrokerError, Result};

/// Runtime configuration for the orchestration core.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Number of queue workers servicing operations concurrently.
    pub worker_count: usize,
    /// Capacity of the step-processed event channel.
    pub event_channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            event_channel_capacity: 1000,
        }
    }
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(workers) = std::env::var("BROKER_WORKER_COUNT") {
            config.worker_count = workers.parse().map_err(|e| {
                BrokerError::ConfigurationError(format!("Invalid worker_count: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("BROKER_EVENT_CHANNEL_CAPACITY") {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                BrokerError::ConfigurationError(format!("Invalid event_channel_capacity: {e}"))
            })?;
        }

        Ok(config)
    }
}
