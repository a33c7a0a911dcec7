//! Simulated broker for local runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use trading_core::error::BrokerError;
use trading_core::traits::BrokerAdapter;
use trading_core::types::{BrokerKind, BrokerOrderRequest, CustomerCredential, Placement};
use uuid::Uuid;

use crate::resolver::MarketIdResolver;

/// How the simulated broker answers.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedBehavior {
    Accept,
    Reject(String),
    RateLimit { retry_after_secs: u64 },
    NetworkFault(String),
    /// Panics inside `submit`, as a defective adapter would
    Panic,
}

/// Broker that fills every order locally.
///
/// Orders are recorded so tests can assert on what was sent. Like real
/// brokers that honour a client reference, a repeated idempotency key returns
/// the original placement instead of placing twice.
#[derive(Clone)]
pub struct SimulatedBroker {
    kind: BrokerKind,
    behavior: Arc<Mutex<SimulatedBehavior>>,
    latency: Duration,
    check_markets: bool,
    orders: Arc<Mutex<Vec<BrokerOrderRequest>>>,
    placements: Arc<Mutex<HashMap<String, Placement>>>,
}

impl SimulatedBroker {
    pub fn new(kind: BrokerKind) -> Self {
        Self {
            kind,
            behavior: Arc::new(Mutex::new(SimulatedBehavior::Accept)),
            latency: Duration::ZERO,
            check_markets: false,
            orders: Arc::new(Mutex::new(Vec::new())),
            placements: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Set the answer given to subsequent orders.
    pub fn with_behavior(self, behavior: SimulatedBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            ..self
        }
    }

    /// Delay every order by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reject instruments the market-id resolver does not know.
    pub fn with_market_check(mut self) -> Self {
        self.check_markets = true;
        self
    }

    pub async fn set_behavior(&self, behavior: SimulatedBehavior) {
        *self.behavior.lock().await = behavior;
    }

    /// Orders received, including rejected ones.
    pub async fn orders(&self) -> Vec<BrokerOrderRequest> {
        self.orders.lock().await.clone()
    }

    /// Number of distinct orders actually placed.
    pub async fn placed_count(&self) -> usize {
        self.placements.lock().await.len()
    }
}

#[async_trait]
impl BrokerAdapter for SimulatedBroker {
    fn kind(&self) -> BrokerKind {
        self.kind.clone()
    }

    async fn submit(
        &self,
        _credential: &CustomerCredential,
        order: &BrokerOrderRequest,
    ) -> Result<Placement, BrokerError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.orders.lock().await.push(order.clone());
        let behavior = self.behavior.lock().await.clone();

        match behavior {
            SimulatedBehavior::Accept => {}
            SimulatedBehavior::Reject(reason) => return Err(BrokerError::OrderRejected(reason)),
            SimulatedBehavior::RateLimit { retry_after_secs } => {
                return Err(BrokerError::RateLimited { retry_after_secs })
            }
            SimulatedBehavior::NetworkFault(msg) => return Err(BrokerError::NetworkError(msg)),
            SimulatedBehavior::Panic => panic!("simulated adapter fault for {}", order.account_name),
        }

        if self.check_markets {
            MarketIdResolver::new().resolve(&order.instrument)?;
        }

        let mut placements = self.placements.lock().await;
        let placement = placements
            .entry(order.idempotency_key.clone())
            .or_insert_with(|| Placement {
                broker_order_id: Some(Uuid::new_v4().to_string()),
                deal_reference: Some(order.client_reference(30)),
            });
        Ok(placement.clone())
    }

    fn name(&self) -> &str {
        "Simulated Broker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use trading_core::types::{Direction, Secret, TradeAction, TradeTrigger};

    fn credential() -> CustomerCredential {
        CustomerCredential {
            account_name: "IG_ROBOTICFUND".to_string(),
            broker: BrokerKind::Ig,
            identifier: "id".to_string(),
            password: Secret::new("pw"),
            api_key: Secret::new("key"),
            base_url: None,
            currency: None,
            position_size: Default::default(),
        }
    }

    fn order(instrument: &str) -> BrokerOrderRequest {
        let trigger = TradeTrigger::new("IG_ROBOTICFUND", instrument, Direction::Long, TradeAction::Open)
            .with_id(Uuid::new_v4());
        BrokerOrderRequest::from_trigger(&trigger, &credential(), dec!(1))
    }

    #[tokio::test]
    async fn test_accepts_and_records() {
        let broker = SimulatedBroker::new(BrokerKind::Ig);
        let response = broker.place_order(&credential(), &order("AUD/USD")).await;

        assert!(response.is_success());
        assert!(response.broker_order_id.is_some());
        assert_eq!(broker.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_idempotency_key_places_once() {
        let broker = SimulatedBroker::new(BrokerKind::Ig);
        let order = order("BHP");

        let first = broker.place_order(&credential(), &order).await;
        let second = broker.place_order(&credential(), &order).await;

        assert_eq!(first.broker_order_id, second.broker_order_id);
        assert_eq!(broker.placed_count().await, 1);
        assert_eq!(broker.orders().await.len(), 2);
    }

    #[tokio::test]
    async fn test_configured_failures() {
        let broker = SimulatedBroker::new(BrokerKind::Ci)
            .with_behavior(SimulatedBehavior::RateLimit { retry_after_secs: 3 });
        let response = broker.place_order(&credential(), &order("AUD/USD")).await;
        assert_eq!(response.error.as_ref().unwrap().kind, "rate_limited");

        broker.set_behavior(SimulatedBehavior::Reject("closed".to_string())).await;
        let response = broker.place_order(&credential(), &order("AUD/USD")).await;
        assert_eq!(response.error.unwrap().kind, "rejected");
    }

    #[tokio::test]
    async fn test_market_check() {
        let broker = SimulatedBroker::new(BrokerKind::Ig).with_market_check();
        let response = broker.place_order(&credential(), &order("XYZ")).await;
        assert_eq!(response.error.unwrap().kind, "market_not_found");
    }
}
