//! Market-data sources and the market-data producer.

mod cache;
mod csv_source;
mod eod;
mod producer;
pub mod resample;

pub use cache::PublishedCache;
pub use csv_source::CsvDataSource;
pub use eod::{EodConfig, EodHistoricalSource};
pub use producer::{InstrumentPoll, MarketDataProducer, PollReport};
