//! Market-data producer: poll a price source, publish new bars once.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use trading_core::error::PublishError;
use trading_core::traits::{publish_json, EventPublisher, PriceSource};
use trading_core::{Resolution, Topic};

use crate::cache::PublishedCache;

/// Per-instrument result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentPoll {
    pub instrument: String,
    pub published: usize,
    /// Why the instrument stopped early, if it did
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    pub instruments: Vec<InstrumentPoll>,
    /// First publish failure, if any
    pub publish_error: Option<PublishError>,
}

impl PollReport {
    pub fn published(&self) -> usize {
        self.instruments.iter().map(|i| i.published).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstrumentPoll> {
        self.instruments.iter().filter(|i| i.error.is_some())
    }
}

/// Publishes each new bar for a set of instruments exactly once per process.
pub struct MarketDataProducer {
    source: Arc<dyn PriceSource>,
    publisher: Arc<dyn EventPublisher>,
    cache: PublishedCache,
    instruments: Vec<String>,
    resolution: Resolution,
}

impl MarketDataProducer {
    pub fn new(
        source: Arc<dyn PriceSource>,
        publisher: Arc<dyn EventPublisher>,
        instruments: Vec<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            source,
            publisher,
            cache: PublishedCache::new(),
            instruments,
            resolution,
        }
    }

    pub fn with_cache(mut self, cache: PublishedCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &PublishedCache {
        &self.cache
    }

    /// Fetch and publish bars newer than each instrument's mark.
    ///
    /// A failing instrument does not stop the others. Bars are published
    /// oldest first and the mark advances after each successful publish, so a
    /// failed publish is retried on the next poll.
    pub async fn poll_once(&mut self) -> PollReport {
        let mut report = PollReport::default();
        let instruments = self.instruments.clone();

        for instrument in instruments {
            let poll = self.poll_instrument(&instrument, &mut report).await;
            report.instruments.push(poll);
        }

        if let Err(e) = self.cache.save().await {
            warn!(error = %e, "Failed to persist publish marks");
        }

        info!(
            source = self.source.name(),
            published = report.published(),
            failed = report.failed().count(),
            "Market-data poll complete"
        );
        report
    }

    async fn poll_instrument(&mut self, instrument: &str, report: &mut PollReport) -> InstrumentPoll {
        let since = self.cache.published_through(instrument, self.resolution);
        let mut poll = InstrumentPoll {
            instrument: instrument.to_string(),
            published: 0,
            error: None,
        };

        let events = match self.source.fetch_bars(instrument, self.resolution, since).await {
            Ok(events) => events,
            Err(e) => {
                warn!(%instrument, error = %e, "Price fetch failed");
                poll.error = Some(e.to_string());
                return poll;
            }
        };

        for event in events {
            if let Err(reason) = event.validate() {
                warn!(%instrument, %reason, "Skipping invalid bar");
                continue;
            }
            match publish_json(self.publisher.as_ref(), Topic::NewMarketDataEvent, &event).await {
                Ok(message_id) => {
                    debug!(%instrument, at = %event.snapshot_time_utc, %message_id, "Bar published");
                    self.cache.mark(instrument, self.resolution, event.snapshot_time_utc);
                    poll.published += 1;
                }
                Err(e) => {
                    error!(%instrument, error = %e, "Failed to publish market data");
                    poll.error = Some(e.to_string());
                    report.publish_error.get_or_insert(e);
                    break;
                }
            }
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;
    use trading_bus::InMemoryBus;
    use trading_core::error::DataError;
    use trading_core::MarketDataEvent;

    /// Serves a fixed set of bars per instrument.
    struct FixedSource {
        bars: Mutex<Vec<MarketDataEvent>>,
    }

    impl FixedSource {
        fn new(bars: Vec<MarketDataEvent>) -> Self {
            Self { bars: Mutex::new(bars) }
        }
    }

    #[async_trait]
    impl PriceSource for FixedSource {
        async fn fetch_bars(
            &self,
            instrument: &str,
            _resolution: Resolution,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<MarketDataEvent>, DataError> {
            if instrument == "MISSING" {
                return Err(DataError::InstrumentNotFound(instrument.to_string()));
            }
            Ok(self
                .bars
                .lock()
                .await
                .iter()
                .filter(|b| b.instrument == instrument && since.map_or(true, |s| b.snapshot_time_utc > s))
                .cloned()
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn bar(instrument: &str, index: i64) -> MarketDataEvent {
        let at = Utc.with_ymd_and_hms(2023, 11, 3, 8, 0, 0).unwrap() + Duration::minutes(10 * index);
        MarketDataEvent {
            instrument: instrument.to_string(),
            datetime: at,
            snapshot_time_utc: at,
            resolution: Resolution::Minute10,
            open_price: dec!(0.65),
            close_price: dec!(0.651),
            high_price: dec!(0.652),
            low_price: dec!(0.649),
            volume: dec!(10),
            insert_stamp: at,
        }
    }

    fn producer(source: Arc<FixedSource>, bus: &InMemoryBus, instruments: &[&str]) -> MarketDataProducer {
        MarketDataProducer::new(
            source,
            Arc::new(bus.clone()),
            instruments.iter().map(|s| s.to_string()).collect(),
            Resolution::Minute10,
        )
    }

    #[tokio::test]
    async fn test_each_bar_published_once() {
        let source = Arc::new(FixedSource::new(vec![bar("AUD/USD", 0), bar("AUD/USD", 1)]));
        let bus = InMemoryBus::new();
        let mut producer = producer(Arc::clone(&source), &bus, &["AUD/USD"]);

        assert_eq!(producer.poll_once().await.published(), 2);
        assert_eq!(producer.poll_once().await.published(), 0);

        source.bars.lock().await.push(bar("AUD/USD", 2));
        assert_eq!(producer.poll_once().await.published(), 1);

        let published: Vec<MarketDataEvent> = bus.published_as(Topic::NewMarketDataEvent).await.unwrap();
        assert_eq!(published.len(), 3);
        assert!(published.windows(2).all(|w| w[0].snapshot_time_utc < w[1].snapshot_time_utc));
    }

    #[tokio::test]
    async fn test_failing_instrument_is_isolated() {
        let source = Arc::new(FixedSource::new(vec![bar("BHP", 0)]));
        let bus = InMemoryBus::new();
        let mut producer = producer(source, &bus, &["MISSING", "BHP"]);

        let report = producer.poll_once().await;
        assert_eq!(report.published(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(report.publish_error.is_none());
    }

    #[tokio::test]
    async fn test_publish_failure_retried_next_poll() {
        let source = Arc::new(FixedSource::new(vec![bar("BHP", 0), bar("BHP", 1)]));
        let bus = InMemoryBus::new();
        let mut producer = producer(source, &bus, &["BHP"]);

        bus.set_unavailable(Topic::NewMarketDataEvent, true).await;
        let report = producer.poll_once().await;
        assert_eq!(report.published(), 0);
        assert!(matches!(report.publish_error, Some(PublishError::Unavailable(_))));
        assert!(producer.cache().published_through("BHP", Resolution::Minute10).is_none());

        bus.set_unavailable(Topic::NewMarketDataEvent, false).await;
        assert_eq!(producer.poll_once().await.published(), 2);
    }
}
