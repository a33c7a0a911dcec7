//! Inbound trade trigger produced by the decision engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::Side;

/// Position direction of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

/// Whether the trigger opens or closes exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeAction {
    Open,
    Close,
}

/// Requested size: an explicit quantity or a named policy on the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSpec {
    Explicit(Decimal),
    Policy { policy: String },
}

/// Instruction to attempt a trade for one customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeTrigger {
    /// Upstream-assigned identifier, stable across redeliveries
    #[serde(default)]
    pub id: Option<Uuid>,
    pub datetime: DateTime<Utc>,
    /// The event that caused this trigger, kept for diagnostics
    #[serde(default)]
    pub input_event: Option<serde_json::Value>,
    pub account_name: String,
    pub instrument: String,
    pub direction: Direction,
    pub action: TradeAction,
    #[serde(default)]
    pub stop: Option<Decimal>,
    #[serde(default)]
    pub limit: Option<Decimal>,
    #[serde(default)]
    pub reference_price: Option<Decimal>,
    #[serde(default)]
    pub size: Option<SizeSpec>,
}

impl TradeTrigger {
    pub fn new(
        account_name: impl Into<String>,
        instrument: impl Into<String>,
        direction: Direction,
        action: TradeAction,
    ) -> Self {
        Self {
            id: None,
            datetime: Utc::now(),
            input_event: None,
            account_name: account_name.into(),
            instrument: instrument.into(),
            direction,
            action,
            stop: None,
            limit: None,
            reference_price: None,
            size: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_size(mut self, size: SizeSpec) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_levels(mut self, stop: Option<Decimal>, limit: Option<Decimal>) -> Self {
        self.stop = stop;
        self.limit = limit;
        self
    }

    pub fn with_reference_price(mut self, price: Decimal) -> Self {
        self.reference_price = Some(price);
        self
    }

    /// Order side implied by direction and action.
    pub fn side(&self) -> Side {
        match (self.action, self.direction) {
            (TradeAction::Open, Direction::Long) => Side::Buy,
            (TradeAction::Open, Direction::Short) => Side::Sell,
            (TradeAction::Close, Direction::Long) => Side::Sell,
            (TradeAction::Close, Direction::Short) => Side::Buy,
        }
    }

    /// Key identifying this trigger across redeliveries.
    ///
    /// Uses the upstream id when present, otherwise a digest of the fields
    /// that define the trade intent.
    pub fn key(&self) -> String {
        if let Some(id) = self.id {
            return id.to_string();
        }
        let direction = match self.direction {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        };
        let action = match self.action {
            TradeAction::Open => "Open",
            TradeAction::Close => "Close",
        };
        let name = format!(
            "{}|{}|{}|{}|{}",
            self.datetime.timestamp_millis(),
            self.account_name,
            self.instrument,
            direction,
            action
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.account_name.trim().is_empty() {
            return Err("accountName must not be empty".to_string());
        }
        if self.instrument.trim().is_empty() {
            return Err("instrument must not be empty".to_string());
        }
        if let Some(SizeSpec::Explicit(size)) = &self.size {
            if *size <= Decimal::ZERO {
                return Err(format!("size must be positive, got {}", size));
            }
        }
        Ok(())
    }
}
