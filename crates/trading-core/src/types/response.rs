//! Normalized broker outcome published on `trade-broker-response`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::BrokerOrderRequest;
use crate::error::BrokerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Structured failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&BrokerError> for ErrorDetail {
    fn from(err: &BrokerError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl ErrorDetail {
    /// Whether the order may have reached the broker despite the failure.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.kind.as_str(), "timeout" | "network")
    }
}

/// What a broker returned for an accepted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub broker_order_id: Option<String>,
    pub deal_reference: Option<String>,
}

/// One outcome per attempted [`BrokerOrderRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerResponse {
    pub account: String,
    pub broker: String,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub trigger_key: String,
    #[serde(default)]
    pub idempotency_key: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    pub datetime: DateTime<Utc>,
}

impl BrokerResponse {
    pub fn success(order: &BrokerOrderRequest, placement: Placement) -> Self {
        Self {
            outcome: Outcome::Success,
            broker_order_id: placement.broker_order_id,
            deal_reference: placement.deal_reference,
            ..Self::base(order)
        }
    }

    pub fn failure(order: &BrokerOrderRequest, err: &BrokerError) -> Self {
        Self {
            outcome: Outcome::Failure,
            error: Some(ErrorDetail::from(err)),
            ..Self::base(order)
        }
    }

    fn base(order: &BrokerOrderRequest) -> Self {
        Self {
            account: order.account_name.clone(),
            broker: order.broker.to_string(),
            instrument: order.instrument.clone(),
            trigger_key: order.trigger_key.clone(),
            idempotency_key: order.idempotency_key.clone(),
            outcome: Outcome::Failure,
            broker_order_id: None,
            deal_reference: None,
            error: None,
            datetime: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
