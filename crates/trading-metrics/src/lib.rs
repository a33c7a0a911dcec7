//! Metrics computer for the trading pipeline.
//!
//! Consumes market-data events, keeps a bounded per-instrument history at the
//! 10-minute and 30-minute tick resolutions, and produces a [`MetricEvent`]
//! carrying t0/t-1/t-2 snapshots of the standard indicator set.
//!
//! [`MetricEvent`]: trading_core::MetricEvent

pub mod computer;
pub mod config;
pub mod error;
pub mod history;
pub mod service;

pub use computer::{MarketDataWindow, MetricsComputer};
pub use config::MetricsConfig;
pub use error::{MetricsError, MetricsResult, MetricsServiceError};
pub use history::TickHistory;
pub use service::{MetricsService, TickOutcome};
