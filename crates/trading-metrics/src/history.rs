//! Rolling per-instrument bar history.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use trading_core::{Bar, BarInsert, BarSeries, MarketDataEvent, Resolution};

/// Bounded bar buffers keyed by instrument and resolution.
///
/// Duplicate deliveries replace the stored bar and out-of-order deliveries
/// are slotted into place, so the buffers stay consistent under an
/// at-least-once, unordered bus.
#[derive(Debug, Clone)]
pub struct TickHistory {
    capacity: usize,
    series: HashMap<(String, Resolution), BarSeries>,
}

impl TickHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: HashMap::new(),
        }
    }

    /// Record a market-data event.
    pub fn ingest(&mut self, event: &MarketDataEvent) -> BarInsert {
        let capacity = self.capacity;
        let key = (event.instrument.clone(), event.resolution);
        let series = self.series.entry(key).or_insert_with(|| {
            BarSeries::with_capacity(event.instrument.clone(), event.resolution, capacity)
        });

        let outcome = series.insert(event.to_bar());
        debug!(
            instrument = %event.instrument,
            resolution = %event.resolution,
            outcome = ?outcome,
            len = series.len(),
            "Bar ingested"
        );
        outcome
    }

    /// Bars for an instrument at a resolution, oldest first.
    pub fn bars(&self, instrument: &str, resolution: Resolution) -> Vec<Bar> {
        self.series
            .get(&(instrument.to_string(), resolution))
            .map(BarSeries::to_vec)
            .unwrap_or_default()
    }

    pub fn len(&self, instrument: &str, resolution: Resolution) -> usize {
        self.series
            .get(&(instrument.to_string(), resolution))
            .map_or(0, BarSeries::len)
    }

    /// The stored bar at exactly `timestamp`, if any.
    pub fn bar_at(&self, instrument: &str, resolution: Resolution, timestamp: DateTime<Utc>) -> Option<Bar> {
        self.series
            .get(&(instrument.to_string(), resolution))
            .and_then(|s| s.get(timestamp).copied())
    }

    pub fn latest(&self, instrument: &str, resolution: Resolution) -> Option<Bar> {
        self.series
            .get(&(instrument.to_string(), resolution))
            .and_then(|s| s.last().copied())
    }
}

impl Default for TickHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn event(minutes: i64, close: rust_decimal::Decimal) -> MarketDataEvent {
        let at = Utc.with_ymd_and_hms(2023, 11, 3, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        MarketDataEvent {
            instrument: "AUD/USD".to_string(),
            datetime: at,
            snapshot_time_utc: at,
            resolution: Resolution::Minute10,
            open_price: dec!(0.65),
            close_price: close,
            high_price: dec!(0.66),
            low_price: dec!(0.64),
            volume: dec!(10),
            insert_stamp: at,
        }
    }

    #[test]
    fn test_duplicates_and_reordering() {
        let mut history = TickHistory::new(500);

        assert_eq!(history.ingest(&event(20, dec!(0.65))), BarInsert::Appended);
        assert_eq!(history.ingest(&event(0, dec!(0.65))), BarInsert::Backfilled);
        assert_eq!(history.ingest(&event(20, dec!(0.651))), BarInsert::Replaced);
        assert_eq!(history.ingest(&event(10, dec!(0.65))), BarInsert::Backfilled);

        let bars = history.bars("AUD/USD", Resolution::Minute10);
        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!((bars[2].close - 0.651).abs() < 1e-12);

        let at = event(10, dec!(0.65)).snapshot_time_utc;
        assert_eq!(history.bar_at("AUD/USD", Resolution::Minute10, at).map(|b| b.timestamp), Some(at));
        assert!(history.bar_at("AUD/USD", Resolution::Minute30, at).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = TickHistory::new(3);
        for i in 0..5 {
            history.ingest(&event(i * 10, dec!(0.65)));
        }
        assert_eq!(history.len("AUD/USD", Resolution::Minute10), 3);
        assert_eq!(history.ingest(&event(0, dec!(0.65))), BarInsert::Dropped);
    }

    #[test]
    fn test_resolutions_are_separate() {
        let mut history = TickHistory::default();
        history.ingest(&event(0, dec!(0.65)));
        assert_eq!(history.len("AUD/USD", Resolution::Minute30), 0);
        assert!(history.latest("AUD/USD", Resolution::Minute10).is_some());
    }
}
