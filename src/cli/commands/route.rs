//! Route command implementation.

use anyhow::{Context, Result};
use trading_config::AppConfig;
use trading_core::TradeTrigger;
use trading_router::{DispatchOutcome, RouteReport, TradeRouter};
use tracing::info;

use crate::cli::context::{self, Bus};
use crate::cli::RouteArgs;

pub async fn run(args: RouteArgs, config: &AppConfig) -> Result<()> {
    let raw = context::read_input(&args.trigger).await?;
    let trigger: TradeTrigger = serde_json::from_str(&raw).context("Invalid trade trigger")?;

    let bus = Bus::from_config(config)?;
    let router = context::router(config, &bus, args.simulated)?;

    let result = route_trigger(&router, &trigger).await;
    bus.print_published().await;
    result.map(|_| ())
}

/// Route one trigger and fail when the invoker should redeliver it.
pub async fn route_trigger(router: &TradeRouter, trigger: &TradeTrigger) -> Result<RouteReport> {
    let report = router.route(trigger).await.map_err(|e| {
        let transient = e.is_transient();
        anyhow::Error::new(e).context(format!("Routing failed (transient: {})", transient))
    })?;

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for record in &report.outcomes {
        let status = match &record.outcome {
            DispatchOutcome::Responded(r) if r.is_success() => "success".to_string(),
            DispatchOutcome::Responded(r) => r
                .error
                .as_ref()
                .map_or_else(|| "failure".to_string(), |e| format!("failure ({})", e.kind)),
            DispatchOutcome::Aborted(event) => format!("aborted ({})", event.error_description),
        };
        println!("{:<24} {:<6} {}", record.account, record.broker, status);
    }
    info!(
        trigger = %report.trigger_key,
        outcomes = report.outcomes.len(),
        skipped = report.skipped.len(),
        "Route complete"
    );

    Ok(report.into_result()?)
}
