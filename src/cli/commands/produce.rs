//! Produce command implementation.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};
use trading_config::AppConfig;
use trading_data::{MarketDataProducer, PublishedCache};

use crate::cli::context::{self, Bus};
use crate::cli::ProduceArgs;

pub async fn run(args: ProduceArgs, config: &AppConfig) -> Result<()> {
    let settings = &config.market_data;
    let instruments = if args.instruments.is_empty() {
        settings.instruments.clone()
    } else {
        args.instruments
    };

    let bus = Bus::from_config(config)?;
    let cache = match &settings.state_file {
        Some(path) => PublishedCache::load(path).await?,
        None => PublishedCache::new(),
    };
    let mut producer = MarketDataProducer::new(
        context::price_source(config)?,
        bus.publisher.clone(),
        instruments,
        settings.resolution,
    )
    .with_cache(cache);

    if args.once {
        let report = producer.poll_once().await;
        bus.print_published().await;
        if let Some(e) = report.publish_error {
            return Err(e.into());
        }
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(settings.poll_interval_secs.max(1)));
    info!(every_secs = settings.poll_interval_secs, "Polling market data");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = producer.poll_once().await;
                if let Some(e) = report.publish_error {
                    warn!(error = %e, "Publish failed, will retry on the next poll");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down producer");
                break;
            }
        }
    }
    Ok(())
}
