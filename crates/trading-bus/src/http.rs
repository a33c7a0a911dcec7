//! HTTP publisher for a notification service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use trading_core::error::PublishError;
use trading_core::traits::EventPublisher;
use trading_core::{Topic, TopicTable};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PublishRequest<'a> {
    topic_arn: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PublishResponse {
    message_id: String,
}

/// Publishes each payload with `POST {endpoint}/publish`.
///
/// The target topic is addressed by the identifier configured in the
/// [`TopicTable`]; a topic without an identifier is an error rather than a
/// silent drop.
pub struct HttpPublisher {
    endpoint: String,
    topics: TopicTable,
    client: Client,
}

impl HttpPublisher {
    pub fn new(endpoint: impl Into<String>, topics: TopicTable) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            topics,
            client,
        })
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, topic: Topic, payload: String) -> Result<String, PublishError> {
        let topic_arn = self
            .topics
            .identifier(topic)
            .ok_or_else(|| PublishError::UnknownTopic(topic.to_string()))?;

        let url = format!("{}/publish", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&PublishRequest {
                topic_arn,
                message: &payload,
            })
            .send()
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%topic, %status, "Publish failed");
            return Err(match status {
                s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                    PublishError::Unavailable(format!("{}: {}", status, text))
                }
                _ => PublishError::Rejected(format!("{}: {}", status, text)),
            });
        }

        let body: PublishResponse = resp
            .json()
            .await
            .map_err(|e| PublishError::Rejected(e.to_string()))?;

        debug!(%topic, message_id = %body.message_id, "Published");
        Ok(body.message_id)
    }
}
