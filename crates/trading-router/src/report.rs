//! Result of routing one trigger.

use trading_core::error::PublishError;
use trading_core::{BrokerResponse, GenericErrorEvent};

use crate::error::RouterError;

/// What became of one dispatch.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The adapter returned a response (success or normalized failure)
    Responded(BrokerResponse),
    /// The dispatch task died before producing a response
    Aborted(GenericErrorEvent),
}

/// One dispatch outcome and the result of publishing it.
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub account: String,
    pub broker: String,
    pub outcome: DispatchOutcome,
    /// Message id, or why publication failed
    pub published: Result<String, PublishError>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteReport {
    pub trigger_key: String,
    /// In completion order
    pub outcomes: Vec<OutcomeRecord>,
    /// Idempotency keys skipped as redeliveries
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
}

impl RouteReport {
    pub fn new(trigger_key: impl Into<String>) -> Self {
        Self {
            trigger_key: trigger_key.into(),
            ..Default::default()
        }
    }

    pub fn responses(&self) -> impl Iterator<Item = &BrokerResponse> {
        self.outcomes.iter().filter_map(|record| match &record.outcome {
            DispatchOutcome::Responded(response) => Some(response),
            DispatchOutcome::Aborted(_) => None,
        })
    }

    pub fn aborted(&self) -> impl Iterator<Item = &GenericErrorEvent> {
        self.outcomes.iter().filter_map(|record| match &record.outcome {
            DispatchOutcome::Aborted(event) => Some(event),
            DispatchOutcome::Responded(_) => None,
        })
    }

    pub fn publish_failures(&self) -> impl Iterator<Item = &PublishError> {
        self.outcomes.iter().filter_map(|record| record.published.as_ref().err())
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Fails when any outcome could not be published, so the invoker can
    /// redeliver.
    pub fn into_result(self) -> Result<Self, RouterError> {
        let failed = self.publish_failures().count();
        let first = self.publish_failures().next().cloned();
        match first {
            Some(first) => Err(RouterError::PublishFailed {
                failed,
                total: self.outcomes.len(),
                first,
            }),
            None => Ok(self),
        }
    }
}
