//! Adapter registry keyed by broker kind.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use trading_core::error::BrokerError;
use trading_core::traits::BrokerAdapter;
use trading_core::types::BrokerKind;

use crate::ci::{CiBroker, CiConfig};
use crate::ig::{IgBroker, IgConfig};
use crate::simulated::SimulatedBroker;

/// Information about a registered adapter.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterInfo {
    pub broker: String,
    pub name: String,
}

/// Registry of broker adapters available to the router.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<BrokerKind, Arc<dyn BrokerAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the live IG and City Index clients.
    pub fn live(ig: IgConfig, ci: CiConfig) -> Result<Self, BrokerError> {
        let mut registry = Self::new();
        registry.register(Arc::new(IgBroker::new(ig)?));
        registry.register(Arc::new(CiBroker::new(ci)?));
        Ok(registry)
    }

    /// Registry with simulated IG and City Index brokers.
    pub fn simulated() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SimulatedBroker::new(BrokerKind::Ig).with_market_check()));
        registry.register(Arc::new(SimulatedBroker::new(BrokerKind::Ci).with_market_check()));
        registry
    }

    /// Register an adapter, replacing any previous one for the same broker.
    pub fn register(&mut self, adapter: Arc<dyn BrokerAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn BrokerAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Get the adapter for a broker.
    pub fn get(&self, kind: &BrokerKind) -> Option<Arc<dyn BrokerAdapter>> {
        self.adapters.get(kind).cloned()
    }

    /// Check if a broker has an adapter.
    pub fn exists(&self, kind: &BrokerKind) -> bool {
        self.adapters.contains_key(kind)
    }

    /// List all registered adapters.
    pub fn list(&self) -> Vec<AdapterInfo> {
        let mut infos: Vec<AdapterInfo> = self
            .adapters
            .iter()
            .map(|(kind, adapter)| AdapterInfo {
                broker: kind.to_string(),
                name: adapter.name().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.broker.cmp(&b.broker));
        infos
    }
}
