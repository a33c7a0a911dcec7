//! Metrics service: history ingestion plus computation and publication.

use std::sync::Arc;
use tracing::{debug, info, warn};
use trading_core::error::DataError;
use trading_core::traits::{publish_json, EventPublisher, PriceSource};
use trading_core::{BarInsert, MarketDataEvent, MetricEvent, Resolution, Topic};

use crate::computer::{MarketDataWindow, MetricsComputer};
use crate::error::{MetricsError, MetricsResult, MetricsServiceError};
use crate::history::TickHistory;

/// Result of handling one market-data event.
#[derive(Debug)]
pub enum TickOutcome {
    /// A metric event was computed and published with this message id
    Published { message_id: String, event: Box<MetricEvent> },
    /// History is still warming up
    Warming { required: usize, available: usize },
    /// Duplicate, late or non-tick bar; nothing new to compute
    Ignored(BarInsert),
}

/// Owns the rolling history for every instrument and publishes a
/// [`MetricEvent`] each time a new tick bar completes a window.
pub struct MetricsService {
    computer: MetricsComputer,
    history: TickHistory,
    publisher: Arc<dyn EventPublisher>,
}

impl MetricsService {
    pub fn new(computer: MetricsComputer, publisher: Arc<dyn EventPublisher>) -> Self {
        let history = TickHistory::new(computer.config().history_capacity);
        Self {
            computer,
            history,
            publisher,
        }
    }

    pub fn history(&self) -> &TickHistory {
        &self.history
    }

    /// Load stored tick bars for the event's instrument from `source`.
    ///
    /// The bar carried by `event` itself is left out so that ingesting the
    /// event afterwards still counts as a new tick. Returns the number of
    /// bars loaded.
    pub async fn seed_history(
        &mut self,
        source: &dyn PriceSource,
        event: &MarketDataEvent,
    ) -> Result<usize, MetricsServiceError> {
        let mut loaded = 0;
        for resolution in [Resolution::Minute10, Resolution::Minute30] {
            let bars = match source.fetch_bars(&event.instrument, resolution, None).await {
                Ok(bars) => bars,
                Err(DataError::InstrumentNotFound(_) | DataError::NoDataAvailable) => {
                    warn!(instrument = %event.instrument, %resolution, source = source.name(), "No stored history");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for bar in bars.iter().filter(|b| {
                !(b.resolution == event.resolution && b.snapshot_time_utc == event.snapshot_time_utc)
            }) {
                self.history.ingest(bar);
                loaded += 1;
            }
        }

        debug!(instrument = %event.instrument, loaded, source = source.name(), "History seeded");
        Ok(loaded)
    }

    /// Ingest a market-data event and publish metrics when a window is ready.
    ///
    /// Publish failures propagate so the invoker can redeliver.
    pub async fn on_market_data(&mut self, event: &MarketDataEvent) -> Result<TickOutcome, MetricsServiceError> {
        let bar = event.to_bar();
        let duplicate = self
            .history
            .bar_at(&event.instrument, event.resolution, bar.timestamp)
            .is_some_and(|stored| stored == bar);
        let inserted = self.history.ingest(event);
        // A corrected bar only moves t0 when it is the newest one
        let newest = self
            .history
            .latest(&event.instrument, event.resolution)
            .is_some_and(|last| last.timestamp == bar.timestamp);

        let is_tick = matches!(event.resolution, Resolution::Minute10 | Resolution::Minute30);
        if duplicate || !is_tick || !newest || matches!(inserted, BarInsert::Backfilled | BarInsert::Dropped) {
            debug!(instrument = %event.instrument, outcome = ?inserted, duplicate, newest, "No new tick");
            return Ok(TickOutcome::Ignored(inserted));
        }

        let metric = match self.compute(event) {
            Ok(metric) => metric,
            Err(MetricsError::InsufficientHistory { resolution, required, available }) => {
                debug!(instrument = %event.instrument, %resolution, required, available, "History warming up");
                return Ok(TickOutcome::Warming { required, available });
            }
            Err(e) => return Err(e.into()),
        };

        let message_id = publish_json(self.publisher.as_ref(), Topic::NewMetricEvent, &metric)
            .await
            .map_err(|e| {
                warn!(instrument = %event.instrument, error = %e, "Failed to publish metric event");
                MetricsServiceError::Publish(e)
            })?;

        info!(instrument = %event.instrument, %message_id, "Metric event published");
        Ok(TickOutcome::Published {
            message_id,
            event: Box::new(metric),
        })
    }

    fn compute(&self, event: &MarketDataEvent) -> MetricsResult<MetricEvent> {
        let input_event =
            serde_json::to_string(event).map_err(|e| MetricsError::Serialization(e.to_string()))?;
        let ten_minute = self.history.bars(&event.instrument, Resolution::Minute10);
        let thirty_minute = self.history.bars(&event.instrument, Resolution::Minute30);

        self.computer.compute_tick(&MarketDataWindow {
            instrument: &event.instrument,
            input_event: &input_event,
            ten_minute: &ten_minute,
            thirty_minute: &thirty_minute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use async_trait::async_trait;
    use chrono::DateTime;
    use trading_bus::InMemoryBus;
    use trading_core::error::PublishError;

    struct StoredBars {
        ten: i64,
        thirty: i64,
    }

    #[async_trait]
    impl PriceSource for StoredBars {
        async fn fetch_bars(
            &self,
            instrument: &str,
            resolution: Resolution,
            _since: Option<DateTime<Utc>>,
        ) -> Result<Vec<MarketDataEvent>, DataError> {
            let count = match resolution {
                Resolution::Minute10 => self.ten,
                Resolution::Minute30 => self.thirty,
                _ => return Err(DataError::NoDataAvailable),
            };
            if count == 0 {
                return Err(DataError::InstrumentNotFound(instrument.to_string()));
            }
            Ok((0..count).map(|i| event(resolution, i)).collect())
        }

        fn name(&self) -> &str {
            "stored"
        }
    }

    fn event(resolution: Resolution, index: i64) -> MarketDataEvent {
        let step = resolution.as_secs() as i64 / 60;
        let at = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap() + Duration::minutes(step * index);
        let close = Decimal::new(6500 + (index % 7) * 3 + index / 5, 4);
        MarketDataEvent {
            instrument: "AUD/USD".to_string(),
            datetime: at,
            snapshot_time_utc: at,
            resolution,
            open_price: close - Decimal::new(2, 4),
            close_price: close,
            high_price: close + Decimal::new(10, 4),
            low_price: close - Decimal::new(10, 4),
            volume: Decimal::new(100, 0),
            insert_stamp: at,
        }
    }

    fn service(bus: &InMemoryBus) -> MetricsService {
        MetricsService::new(MetricsComputer::default(), Arc::new(bus.clone()))
    }

    async fn warm(service: &mut MetricsService, thirty: i64, ten: i64) {
        for i in 0..thirty {
            service.on_market_data(&event(Resolution::Minute30, i)).await.unwrap();
        }
        for i in 0..ten {
            service.on_market_data(&event(Resolution::Minute10, i)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_warming_until_history_is_long_enough() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        warm(&mut service, 120, 100).await;

        match service.on_market_data(&event(Resolution::Minute10, 99)).await.unwrap() {
            TickOutcome::Ignored(_) => {}
            other => panic!("duplicate should be ignored, got {:?}", other),
        }
        assert!(bus.published(Topic::NewMetricEvent).await.is_empty());

        let outcome = service.on_market_data(&event(Resolution::Minute10, 100)).await.unwrap();
        let TickOutcome::Published { message_id, event } = outcome else {
            panic!("expected a published metric event");
        };
        assert_eq!(event.instrument, "AUD/USD");
        assert_eq!(event.tick_10_min.t0.datetime, self::event(Resolution::Minute10, 100).datetime);

        let published = bus.published(Topic::NewMetricEvent).await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, message_id);
        let decoded: MetricEvent = serde_json::from_str(&published[0].payload).unwrap();
        assert_eq!(decoded.instrument, "AUD/USD");
        assert!(decoded.input_event.contains("MINUTE_10"));
    }

    #[tokio::test]
    async fn test_redelivered_older_bar_is_ignored() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        warm(&mut service, 120, 101).await;
        assert_eq!(bus.published(Topic::NewMetricEvent).await.len(), 1);

        let outcome = service.on_market_data(&event(Resolution::Minute10, 99)).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Ignored(BarInsert::Replaced)));

        let mut corrected = event(Resolution::Minute10, 98);
        corrected.close_price += Decimal::new(1, 4);
        let outcome = service.on_market_data(&corrected).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Ignored(BarInsert::Replaced)));

        assert_eq!(bus.published(Topic::NewMetricEvent).await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrected_newest_bar_is_recomputed() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        warm(&mut service, 120, 101).await;

        let mut corrected = event(Resolution::Minute10, 100);
        corrected.close_price += Decimal::new(1, 4);
        let outcome = service.on_market_data(&corrected).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published { .. }));
        assert_eq!(bus.published(Topic::NewMetricEvent).await.len(), 2);
    }

    #[tokio::test]
    async fn test_seeded_history_publishes_first_tick() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        let source = StoredBars { ten: 101, thirty: 120 };

        // The store already holds the delivered bar
        let delivered = event(Resolution::Minute10, 100);
        let loaded = service.seed_history(&source, &delivered).await.unwrap();
        assert_eq!(loaded, 100 + 120);

        let outcome = service.on_market_data(&delivered).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Published { .. }));
        assert_eq!(bus.published(Topic::NewMetricEvent).await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_history_keeps_warming() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        let source = StoredBars { ten: 50, thirty: 0 };

        let delivered = event(Resolution::Minute10, 50);
        assert_eq!(service.seed_history(&source, &delivered).await.unwrap(), 50);

        let outcome = service.on_market_data(&delivered).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Warming { required: 101, available: 51 }));
    }

    #[tokio::test]
    async fn test_short_history_reports_counts() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);

        let outcome = service.on_market_data(&event(Resolution::Minute10, 0)).await.unwrap();
        assert!(matches!(
            outcome,
            TickOutcome::Warming { required: 101, available: 1 }
        ));
    }

    #[tokio::test]
    async fn test_late_bar_is_not_recomputed() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        warm(&mut service, 120, 0).await;
        service.on_market_data(&event(Resolution::Minute10, 5)).await.unwrap();

        let outcome = service.on_market_data(&event(Resolution::Minute10, 2)).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Ignored(BarInsert::Backfilled)));
        assert_eq!(service.history().len("AUD/USD", Resolution::Minute10), 2);
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let bus = InMemoryBus::new();
        let mut service = service(&bus);
        warm(&mut service, 120, 100).await;
        bus.set_unavailable(Topic::NewMetricEvent, true).await;

        let err = service
            .on_market_data(&event(Resolution::Minute10, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MetricsServiceError::Publish(PublishError::Unavailable(_))
        ));
    }
}
