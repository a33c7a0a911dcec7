//! Core types and traits for the trading pipeline.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, MarketDataEvent)
//! - Trigger, order and broker-response types
//! - Customer credentials and metric events
//! - Bus topics and the inbound-event tagged union
//! - Core traits for broker adapters, secret stores, publishers, price sources and indicators

pub mod error;
pub mod traits;
pub mod types;

pub use error::{TradingError, TradingResult};
pub use traits::*;
pub use types::*;
