//! In-process topic bus.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use trading_core::error::PublishError;
use trading_core::traits::EventPublisher;
use trading_core::Topic;
use uuid::Uuid;

/// A message as stored and broadcast by the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub id: String,
    pub topic: Topic,
    pub payload: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Default)]
struct BusState {
    channels: HashMap<Topic, broadcast::Sender<BusMessage>>,
    history: Vec<BusMessage>,
    unavailable: HashSet<Topic>,
}

/// Topic bus backed by tokio broadcast channels.
///
/// Every published message is also kept in a history so callers that did not
/// subscribe in time can still inspect what was published. Topics can be
/// marked unavailable to exercise publish-failure handling.
#[derive(Clone)]
pub struct InMemoryBus {
    state: Arc<Mutex<BusState>>,
    capacity: usize,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Subscribers that fall more than `capacity` messages behind lag.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a topic. Lagged messages are surfaced as stream errors.
    pub async fn subscribe(&self, topic: Topic) -> BroadcastStream<BusMessage> {
        let mut state = self.state.lock().await;
        let capacity = self.capacity;
        let sender = state
            .channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(capacity).0);
        BroadcastStream::new(sender.subscribe())
    }

    /// Messages published to `topic`, oldest first.
    pub async fn published(&self, topic: Topic) -> Vec<BusMessage> {
        let state = self.state.lock().await;
        state
            .history
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Decode every payload published to `topic` as `T`.
    pub async fn published_as<T: serde::de::DeserializeOwned>(
        &self,
        topic: Topic,
    ) -> Result<Vec<T>, serde_json::Error> {
        self.published(topic)
            .await
            .iter()
            .map(|m| serde_json::from_str(&m.payload))
            .collect()
    }

    pub async fn set_unavailable(&self, topic: Topic, unavailable: bool) {
        let mut state = self.state.lock().await;
        if unavailable {
            state.unavailable.insert(topic);
        } else {
            state.unavailable.remove(&topic);
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryBus {
    async fn publish(&self, topic: Topic, payload: String) -> Result<String, PublishError> {
        let mut state = self.state.lock().await;
        if state.unavailable.contains(&topic) {
            warn!(%topic, "Topic unavailable");
            return Err(PublishError::Unavailable(format!("{} is unavailable", topic)));
        }

        let message = BusMessage {
            id: Uuid::new_v4().to_string(),
            topic,
            payload,
            published_at: Utc::now(),
        };

        if let Some(sender) = state.channels.get(&topic) {
            // No live subscribers is fine; the history still records it
            let receivers = sender.send(message.clone()).unwrap_or(0);
            debug!(%topic, id = %message.id, receivers, "Message broadcast");
        }

        let id = message.id.clone();
        state.history.push(message);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_publish_records_history() {
        let bus = InMemoryBus::new();
        let id = bus
            .publish(Topic::TradeBrokerResponse, "{\"a\":1}".to_string())
            .await
            .unwrap();

        let published = bus.published(Topic::TradeBrokerResponse).await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, id);
        assert!(bus.published(Topic::NewMetricEvent).await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_receive_only_their_topic() {
        let bus = InMemoryBus::new();
        let mut stream = bus.subscribe(Topic::NewTradeEvent).await;

        bus.publish(Topic::NewMetricEvent, "m".to_string()).await.unwrap();
        bus.publish(Topic::NewTradeEvent, "t".to_string()).await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.topic, Topic::NewTradeEvent);
        assert_eq!(received.payload, "t");
    }

    #[tokio::test]
    async fn test_unavailable_topic_fails_publish() {
        let bus = InMemoryBus::new();
        bus.set_unavailable(Topic::TradeBrokerResponse, true).await;

        let err = bus
            .publish(Topic::TradeBrokerResponse, "{}".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Unavailable(_)));
        assert!(bus.published(Topic::TradeBrokerResponse).await.is_empty());

        bus.set_unavailable(Topic::TradeBrokerResponse, false).await;
        assert!(bus.publish(Topic::TradeBrokerResponse, "{}".to_string()).await.is_ok());
    }
}
