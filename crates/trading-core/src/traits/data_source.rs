//! Price source trait definition.

use crate::error::DataError;
use crate::types::{MarketDataEvent, Resolution};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for market-data price sources.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch bars for an instrument.
    ///
    /// # Arguments
    /// * `instrument` - Instrument in pipeline form, e.g. `AUD/USD`
    /// * `resolution` - Bar resolution
    /// * `since` - Only bars strictly after this time, when set
    ///
    /// # Returns
    /// Events ordered from oldest to newest
    async fn fetch_bars(
        &self,
        instrument: &str,
        resolution: Resolution,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MarketDataEvent>, DataError>;

    /// Get the source name.
    fn name(&self) -> &str;
}
