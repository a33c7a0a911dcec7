//! Event bus adapters.
//!
//! Provides:
//! - [`InMemoryBus`]: per-topic broadcast channels with a retained history
//! - [`HttpPublisher`]: publishes to a notification service over HTTP
//! - [`decode_inbound`]: unwraps delivery envelopes into typed events

pub mod envelope;
pub mod http;
pub mod memory;

pub use envelope::{decode_inbound, Delivery};
pub use http::HttpPublisher;
pub use memory::{BusMessage, InMemoryBus};
