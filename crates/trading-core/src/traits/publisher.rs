//! Event publisher trait definition.

use crate::error::PublishError;
use crate::types::Topic;
use async_trait::async_trait;
use serde::Serialize;

/// Publishes payloads to topics on the event bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a raw JSON payload.
    ///
    /// # Returns
    /// The bus-assigned message id
    async fn publish(&self, topic: Topic, payload: String) -> Result<String, PublishError>;
}

/// Serialize `event` and publish it to `topic`.
pub async fn publish_json<P, T>(publisher: &P, topic: Topic, event: &T) -> Result<String, PublishError>
where
    P: EventPublisher + ?Sized,
    T: Serialize + Sync,
{
    let payload =
        serde_json::to_string(event).map_err(|e| PublishError::Serialization(e.to_string()))?;
    publisher.publish(topic, payload).await
}
