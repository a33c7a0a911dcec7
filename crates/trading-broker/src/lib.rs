//! Broker integrations.
//!
//! Every adapter implements [`BrokerAdapter`](trading_core::traits::BrokerAdapter)
//! and normalizes broker-specific outcomes into a `BrokerResponse`.

pub mod ci;
mod http;
pub mod ig;
pub mod registry;
pub mod resolver;
pub mod simulated;

pub use ci::{CiBroker, CiConfig};
pub use ig::{IgBroker, IgConfig};
pub use registry::{AdapterInfo, AdapterRegistry};
pub use resolver::{pip_size, MarketIdResolver, MarketIds};
pub use simulated::{SimulatedBehavior, SimulatedBroker};
