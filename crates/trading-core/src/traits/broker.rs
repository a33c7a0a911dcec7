//! Broker adapter trait definition.

use crate::error::BrokerError;
use crate::types::{BrokerKind, BrokerOrderRequest, BrokerResponse, CustomerCredential, Placement};
use async_trait::async_trait;

/// Trait for broker integrations.
///
/// Adapters translate a [`BrokerOrderRequest`] into the broker's own API
/// calls. Implementors only provide [`submit`](BrokerAdapter::submit); the
/// router calls [`place_order`](BrokerAdapter::place_order), which folds any
/// failure into a normalized [`BrokerResponse`].
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Which broker this adapter serves.
    fn kind(&self) -> BrokerKind;

    /// Submit an order using the given account credential.
    ///
    /// # Arguments
    /// * `credential` - Account credential the order is placed under
    /// * `order` - The order to place
    ///
    /// # Returns
    /// The broker's identifiers for the accepted order
    async fn submit(
        &self,
        credential: &CustomerCredential,
        order: &BrokerOrderRequest,
    ) -> Result<Placement, BrokerError>;

    /// Place an order and always return a normalized response.
    async fn place_order(
        &self,
        credential: &CustomerCredential,
        order: &BrokerOrderRequest,
    ) -> BrokerResponse {
        match self.submit(credential, order).await {
            Ok(placement) => BrokerResponse::success(order, placement),
            Err(e) => BrokerResponse::failure(order, &e),
        }
    }

    /// Get the adapter name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Secret, TradeAction, TradeTrigger};
    use rust_decimal_macros::dec;

    struct Rejecting;

    #[async_trait]
    impl BrokerAdapter for Rejecting {
        fn kind(&self) -> BrokerKind {
            BrokerKind::Ci
        }

        async fn submit(
            &self,
            _credential: &CustomerCredential,
            _order: &BrokerOrderRequest,
        ) -> Result<Placement, BrokerError> {
            Err(BrokerError::OrderRejected("market closed".to_string()))
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    #[tokio::test]
    async fn test_place_order_normalizes_failure() {
        let credential = CustomerCredential {
            account_name: "CI_ACC".to_string(),
            broker: BrokerKind::Ci,
            identifier: "id".to_string(),
            password: Secret::new("pw"),
            api_key: Secret::new("key"),
            base_url: None,
            currency: None,
            position_size: Default::default(),
        };
        let trigger = TradeTrigger::new("CI_ACC", "EUR/USD", Direction::Long, TradeAction::Close);
        let order = BrokerOrderRequest::from_trigger(&trigger, &credential, dec!(1));

        let response = Rejecting.place_order(&credential, &order).await;
        assert!(!response.is_success());
        assert_eq!(response.broker, "CI");
        assert_eq!(response.error.unwrap().kind, "rejected");
    }
}
