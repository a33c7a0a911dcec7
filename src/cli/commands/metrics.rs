//! Metrics command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use trading_config::AppConfig;
use trading_core::MarketDataEvent;
use trading_metrics::{MetricsComputer, MetricsService, TickOutcome};

use crate::cli::context::{self, Bus};
use crate::cli::MetricsArgs;

pub async fn run(args: MetricsArgs, config: &AppConfig) -> Result<()> {
    let raw = context::read_input(&args.input).await?;
    let bus = Bus::from_config(config)?;
    let mut service = MetricsService::new(
        MetricsComputer::new(config.metrics.clone())?,
        Arc::clone(&bus.publisher),
    );

    let (mut published, mut warming, mut ignored) = (0usize, 0usize, 0usize);
    for (line_no, line) in raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let event: MarketDataEvent = serde_json::from_str(line)
            .with_context(|| format!("Invalid market-data event on line {}", line_no + 1))?;
        match service.on_market_data(&event).await? {
            TickOutcome::Published { .. } => published += 1,
            TickOutcome::Warming { .. } => warming += 1,
            TickOutcome::Ignored(_) => ignored += 1,
        }
    }

    bus.print_published().await;
    println!("published: {}  warming: {}  ignored: {}", published, warming, ignored);
    Ok(())
}
