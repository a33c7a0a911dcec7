//! Core data types for the trading pipeline.

mod credential;
mod error_event;
mod market;
mod metrics;
mod order;
mod response;
mod topic;
mod trigger;

pub use credential::{BrokerKind, CustomerCredential, PositionSizeConfig, Secret};
pub use error_event::GenericErrorEvent;
pub use market::{Bar, BarInsert, BarSeries, MarketDataEvent, Resolution};
pub use metrics::{MetricEvent, StandardMetrics, TickSnapshots};
pub use order::{BrokerOrderRequest, Side};
pub use response::{BrokerResponse, ErrorDetail, Outcome, Placement};
pub use topic::{InboundEvent, Topic, TopicTable};
pub use trigger::{Direction, SizeSpec, TradeAction, TradeTrigger};
