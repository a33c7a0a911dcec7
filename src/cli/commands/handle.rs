//! Handle command: decode one bus delivery and run the matching service.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use trading_bus::decode_inbound;
use trading_config::AppConfig;
use trading_core::traits::{publish_json, EventPublisher};
use trading_core::{GenericErrorEvent, InboundEvent, MarketDataEvent, Topic};
use trading_metrics::{MetricsComputer, MetricsService, TickOutcome};

use super::route::route_trigger;
use crate::cli::context::{self, Bus};
use crate::cli::HandleArgs;

pub async fn run(args: HandleArgs, config: &AppConfig) -> Result<()> {
    let raw = context::read_input(&args.input).await?;
    let default_topic = args
        .topic
        .as_deref()
        .map(str::parse::<Topic>)
        .transpose()
        .context("Unknown --topic")?;

    let bus = Bus::from_config(config)?;
    let deliveries = match decode_inbound(&raw, &config.topics.topic_table(), default_topic) {
        Ok(deliveries) => deliveries,
        Err(e) => {
            // Undecodable input is reported, not retried
            let event = GenericErrorEvent::new("", &config.app.name, raw.as_str(), e.to_string());
            publish_json(bus.publisher.as_ref(), Topic::GenericErrorEvent, &event).await?;
            bus.print_published().await;
            return Err(e).context("Failed to decode delivery");
        }
    };

    let mut result = Ok(());
    for delivery in deliveries {
        info!(topic = %delivery.topic, "Handling delivery");
        let handled = match delivery.event {
            InboundEvent::TradeTrigger(trigger) => {
                let router = context::router(config, &bus, args.simulated)?;
                route_trigger(&router, &trigger).await.map(|_| ())
            }
            InboundEvent::MarketData(event) => {
                handle_market_data(config, Arc::clone(&bus.publisher), &event)
                    .await
                    .map(|outcome| info!(?outcome, "Market data handled"))
            }
            other => {
                warn!(topic = %other.topic(), "No handler for topic, ignoring");
                Ok(())
            }
        };
        if let Err(e) = handled {
            result = Err(e);
        }
    }

    bus.print_published().await;
    result
}

/// Compute metrics for one delivered bar, loading the instrument's stored
/// history from the configured price source first.
pub async fn handle_market_data(
    config: &AppConfig,
    publisher: Arc<dyn EventPublisher>,
    event: &MarketDataEvent,
) -> Result<TickOutcome> {
    let source = context::price_source(config).context("No price source for metric history")?;
    let mut service = MetricsService::new(MetricsComputer::new(config.metrics.clone())?, publisher);
    service.seed_history(source.as_ref(), event).await?;
    Ok(service.on_market_data(event).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::fmt::Write as _;
    use trading_bus::InMemoryBus;
    use trading_config::PriceProvider;
    use trading_core::{MetricEvent, Resolution};

    fn close(i: i64) -> Decimal {
        Decimal::new(6500 + (i % 9) * 4 + i / 3, 4)
    }

    fn write_bars(dir: &std::path::Path, resolution: Resolution, count: i64) {
        let step = resolution.as_secs() as i64 / 60;
        let start = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap();
        let mut csv = String::from("datetime,open,high,low,close,volume\n");
        for i in 0..count {
            let at = start + Duration::minutes(step * i);
            let c = close(i);
            writeln!(
                csv,
                "{},{},{},{},{},100",
                at.to_rfc3339(),
                c,
                c + Decimal::new(10, 4),
                c - Decimal::new(10, 4),
                c
            )
            .unwrap();
        }
        std::fs::write(dir.join(format!("AUDUSD_{}.csv", resolution)), csv).unwrap();
    }

    fn delivered(index: i64) -> MarketDataEvent {
        let at = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap() + Duration::minutes(10 * index);
        let c = close(index);
        MarketDataEvent {
            instrument: "AUD/USD".to_string(),
            datetime: at,
            snapshot_time_utc: at,
            resolution: Resolution::Minute10,
            open_price: c,
            close_price: c,
            high_price: c + Decimal::new(10, 4),
            low_price: c - Decimal::new(10, 4),
            volume: Decimal::new(100, 0),
            insert_stamp: at,
        }
    }

    fn csv_config(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.market_data.provider = PriceProvider::Csv;
        config.market_data.csv_path = Some(dir.display().to_string());
        config
    }

    #[tokio::test]
    async fn test_market_data_publishes_metric_once_history_exists() {
        let dir = tempfile::tempdir().unwrap();
        write_bars(dir.path(), Resolution::Minute10, 100);
        write_bars(dir.path(), Resolution::Minute30, 110);
        let bus = InMemoryBus::new();

        let outcome = handle_market_data(&csv_config(dir.path()), Arc::new(bus.clone()), &delivered(100))
            .await
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Published { .. }));

        let published = bus.published(Topic::NewMetricEvent).await;
        assert_eq!(published.len(), 1);
        let metric: MetricEvent = serde_json::from_str(&published[0].payload).unwrap();
        assert_eq!(metric.instrument, "AUD/USD");
        assert_eq!(metric.tick_10_min.t0.datetime, delivered(100).snapshot_time_utc);
    }

    #[tokio::test]
    async fn test_market_data_without_history_is_warming() {
        let dir = tempfile::tempdir().unwrap();
        write_bars(dir.path(), Resolution::Minute10, 20);
        let bus = InMemoryBus::new();

        let outcome = handle_market_data(&csv_config(dir.path()), Arc::new(bus.clone()), &delivered(20))
            .await
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Warming { required: 101, available: 21 }));
        assert!(bus.published(Topic::NewMetricEvent).await.is_empty());
    }
}
