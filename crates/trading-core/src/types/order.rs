//! Per-broker order requests derived from a trigger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::credential::{BrokerKind, CustomerCredential};
use super::trigger::{TradeAction, TradeTrigger};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One order for one broker account, built from a trigger and a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerOrderRequest {
    pub broker: BrokerKind,
    pub account_name: String,
    pub instrument: String,
    pub side: Side,
    pub action: TradeAction,
    pub size: Decimal,
    pub stop: Option<Decimal>,
    pub limit: Option<Decimal>,
    pub reference_price: Option<Decimal>,
    /// Key of the originating trigger
    pub trigger_key: String,
    /// `<triggerKey>:<broker>:<accountName>`, passed to brokers that accept a
    /// client reference so a redelivered trigger cannot double-place.
    pub idempotency_key: String,
}

impl BrokerOrderRequest {
    pub fn from_trigger(trigger: &TradeTrigger, credential: &CustomerCredential, size: Decimal) -> Self {
        let trigger_key = trigger.key();
        let idempotency_key = format!(
            "{}:{}:{}",
            trigger_key, credential.broker, credential.account_name
        );
        Self {
            broker: credential.broker.clone(),
            account_name: credential.account_name.clone(),
            instrument: trigger.instrument.clone(),
            side: trigger.side(),
            action: trigger.action,
            size,
            stop: trigger.stop,
            limit: trigger.limit,
            reference_price: trigger.reference_price,
            trigger_key,
            idempotency_key,
        }
    }

    /// Client reference no longer than `max_len`, derived from the
    /// idempotency key. Brokers cap reference lengths.
    pub fn client_reference(&self, max_len: usize) -> String {
        let cleaned: String = self
            .idempotency_key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        if cleaned.len() <= max_len {
            cleaned
        } else {
            cleaned[cleaned.len() - max_len..].to_string()
        }
    }
}
