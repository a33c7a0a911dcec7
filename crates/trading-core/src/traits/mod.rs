//! Core traits for the trading pipeline.

mod broker;
mod data_source;
mod indicator;
mod publisher;
mod secret_store;

pub use broker::BrokerAdapter;
pub use data_source::PriceSource;
pub use indicator::{Indicator, MultiOutputIndicator};
pub use publisher::{publish_json, EventPublisher};
pub use secret_store::SecretStore;
