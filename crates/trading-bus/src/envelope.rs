//! Inbound delivery decoding.

use serde::Deserialize;
use trading_core::error::DecodeError;
use trading_core::{InboundEvent, Topic, TopicTable};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records")]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Sns")]
    sns: Notification,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Notification {
    topic_arn: String,
    message: String,
}

/// One decoded event plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: Topic,
    /// The raw message, kept for error events and metric `inputEvent`s
    pub raw: String,
    pub event: InboundEvent,
}

/// Decode a raw delivery.
///
/// A notification envelope (`{"Records":[{"Sns":{...}}]}`) is unwrapped and
/// each record's topic resolved through `topics`. Any other payload is
/// decoded as a bare message on `default_topic`; without one it is rejected.
pub fn decode_inbound(
    raw: &str,
    topics: &TopicTable,
    default_topic: Option<Topic>,
) -> Result<Vec<Delivery>, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))?;

    if value.get("Records").is_some() {
        let envelope: Envelope = serde_json::from_value(value)
            .map_err(|e| DecodeError::InvalidEnvelope(e.to_string()))?;
        if envelope.records.is_empty() {
            return Err(DecodeError::InvalidEnvelope("no records".to_string()));
        }
        return envelope
            .records
            .into_iter()
            .map(|record| {
                let topic = topics.resolve(&record.sns.topic_arn)?;
                decode_one(topic, record.sns.message)
            })
            .collect();
    }

    let topic = default_topic
        .ok_or_else(|| DecodeError::InvalidEnvelope("bare payload without a topic".to_string()))?;
    Ok(vec![decode_one(topic, raw.to_string())?])
}

fn decode_one(topic: Topic, raw: String) -> Result<Delivery, DecodeError> {
    let event = InboundEvent::decode(topic, &raw)?;
    Ok(Delivery { topic, raw, event })
}
