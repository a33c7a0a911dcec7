//! Bus topics and inbound-event decoding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error_event::GenericErrorEvent;
use super::market::MarketDataEvent;
use super::metrics::MetricEvent;
use super::response::BrokerResponse;
use super::trigger::TradeTrigger;
use crate::error::DecodeError;

/// Logical topics of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    NewMarketDataEvent,
    NewMetricEvent,
    NewTradeEvent,
    TradeBrokerResponse,
    GenericErrorEvent,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::NewMarketDataEvent => "new-market-data-event",
            Topic::NewMetricEvent => "new-metric-event",
            Topic::NewTradeEvent => "new-trade-event",
            Topic::TradeBrokerResponse => "trade-broker-response",
            Topic::GenericErrorEvent => "generic-error-event",
        }
    }

    pub fn all() -> &'static [Topic] {
        &[
            Topic::NewMarketDataEvent,
            Topic::NewMetricEvent,
            Topic::NewTradeEvent,
            Topic::TradeBrokerResponse,
            Topic::GenericErrorEvent,
        ]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::all()
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| DecodeError::UnknownTopic(s.to_string()))
    }
}

/// Mapping from logical topics to deployed identifiers (e.g. ARNs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicTable {
    identifiers: HashMap<Topic, String>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, topic: Topic, identifier: impl Into<String>) -> Self {
        self.identifiers.insert(topic, identifier.into());
        self
    }

    pub fn identifier(&self, topic: Topic) -> Option<&str> {
        self.identifiers.get(&topic).map(String::as_str)
    }

    /// Resolve a deployed identifier back to its topic.
    ///
    /// Matches the exact identifier first, then a bare topic name.
    pub fn resolve(&self, identifier: &str) -> Result<Topic, DecodeError> {
        self.identifiers
            .iter()
            .find(|(_, id)| id.as_str() == identifier)
            .map(|(topic, _)| *topic)
            .map_or_else(|| Topic::from_str(identifier), Ok)
    }
}

/// Every event the pipeline understands, tagged by topic.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    MarketData(MarketDataEvent),
    Metric(Box<MetricEvent>),
    TradeTrigger(TradeTrigger),
    BrokerResponse(BrokerResponse),
    Error(GenericErrorEvent),
}

impl InboundEvent {
    /// Decode and validate a raw payload received on `topic`.
    pub fn decode(topic: Topic, payload: &str) -> Result<Self, DecodeError> {
        let invalid = |e: serde_json::Error| DecodeError::InvalidPayload {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let event = match topic {
            Topic::NewMarketDataEvent => {
                let event: MarketDataEvent = serde_json::from_str(payload).map_err(invalid)?;
                event.validate().map_err(DecodeError::Validation)?;
                InboundEvent::MarketData(event)
            }
            Topic::NewMetricEvent => {
                InboundEvent::Metric(Box::new(serde_json::from_str(payload).map_err(invalid)?))
            }
            Topic::NewTradeEvent => {
                let trigger: TradeTrigger = serde_json::from_str(payload).map_err(invalid)?;
                trigger.validate().map_err(DecodeError::Validation)?;
                InboundEvent::TradeTrigger(trigger)
            }
            Topic::TradeBrokerResponse => {
                InboundEvent::BrokerResponse(serde_json::from_str(payload).map_err(invalid)?)
            }
            Topic::GenericErrorEvent => {
                InboundEvent::Error(serde_json::from_str(payload).map_err(invalid)?)
            }
        };

        Ok(event)
    }

    pub fn topic(&self) -> Topic {
        match self {
            InboundEvent::MarketData(_) => Topic::NewMarketDataEvent,
            InboundEvent::Metric(_) => Topic::NewMetricEvent,
            InboundEvent::TradeTrigger(_) => Topic::NewTradeEvent,
            InboundEvent::BrokerResponse(_) => Topic::TradeBrokerResponse,
            InboundEvent::Error(_) => Topic::GenericErrorEvent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::TradeBrokerResponse.name(), "trade-broker-response");
        assert_eq!(Topic::from_str("new-metric-event").unwrap(), Topic::NewMetricEvent);
        assert!(matches!(Topic::from_str("nope"), Err(DecodeError::UnknownTopic(_))));
    }

    #[test]
    fn test_topic_table_resolution() {
        let arn = "arn:aws:sns:ap-southeast-2:000000000000:new-trade-event-X1";
        let table = TopicTable::new().with(Topic::NewTradeEvent, arn);

        assert_eq!(table.resolve(arn).unwrap(), Topic::NewTradeEvent);
        assert_eq!(table.resolve("trade-broker-response").unwrap(), Topic::TradeBrokerResponse);
        assert!(table.resolve("arn:aws:sns:elsewhere").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_trigger() {
        let payload = r#"{"datetime":"2023-11-03T20:50:00Z","accountName":"","instrument":"BHP","direction":"LONG","action":"Open"}"#;
        assert!(matches!(
            InboundEvent::decode(Topic::NewTradeEvent, payload),
            Err(DecodeError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_distinguishes_garbage() {
        let err = InboundEvent::decode(Topic::NewMarketDataEvent, r#"{"instrument":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload { .. }));
    }

    #[test]
    fn test_decode_trigger() {
        let payload = r#"{"datetime":"2023-11-03T20:50:00Z","accountName":"IG_ROBOTICFUND","instrument":"BHP","direction":"LONG","action":"Open"}"#;
        let event = InboundEvent::decode(Topic::NewTradeEvent, payload).unwrap();
        assert_eq!(event.topic(), Topic::NewTradeEvent);
        assert!(matches!(event, InboundEvent::TradeTrigger(t) if t.account_name == "IG_ROBOTICFUND"));
    }
}
