use tokio::sync::broadcast;

use super::types::StepProcessed;

/// Fire-and-forget publisher for step-processed events.
#[derive(Debug, Clone)]
pub struct ProcessEventPublisher {
    sender: broadcast::Sender<StepProcessed>,
}

impl ProcessEventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a step-processed event.
    ///
    /// Publishing without subscribers is not an error; the orchestrator never
    /// blocks or fails on account of observers.
    pub fn publish(&self, event: StepProcessed) -> Result<(), PublishError> {
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            // No subscribers - acceptable for fire-and-forget publishing
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<StepProcessed> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProcessEventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event channel is closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operation;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    fn sample_event(step_name: &str) -> StepProcessed {
        let op = Operation::new_provisioning("instance-1", json!({}));
        StepProcessed {
            step_name: step_name.to_string(),
            duration: Duration::from_millis(5),
            when: Duration::ZERO,
            error: None,
            old_operation: op.clone(),
            operation: op,
            published_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let publisher = ProcessEventPublisher::new(16);
        publisher.publish(sample_event("resolve_credentials")).unwrap();
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let publisher = ProcessEventPublisher::new(16);
        let mut rx = publisher.subscribe();

        publisher.publish(sample_event("create_runtime")).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.step_name, "create_runtime");
        assert_eq!(
            event.kind(),
            crate::events::ProcessEventKind::ProvisioningStepProcessed
        );
    }
}
