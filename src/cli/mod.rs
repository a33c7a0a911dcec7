//! CLI definitions.

pub mod commands;
pub mod context;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trading-pipeline")]
#[command(author, version, about = "Market data, metrics and multi-broker trade routing")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "TRADING_CONFIG")]
    pub config: PathBuf,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a trade trigger to every broker account of its customer
    Route(RouteArgs),
    /// Compute metric events from a file of market-data events
    Metrics(MetricsArgs),
    /// Poll the price source and publish new market data
    Produce(ProduceArgs),
    /// Handle one bus delivery (envelope or bare payload)
    Handle(HandleArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct RouteArgs {
    /// Trigger JSON file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub trigger: PathBuf,

    /// Route to simulated brokers instead of the live APIs
    #[arg(long)]
    pub simulated: bool,
}

#[derive(clap::Args)]
pub struct MetricsArgs {
    /// Market-data events, one JSON object per line
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(clap::Args)]
pub struct ProduceArgs {
    /// Poll once and exit
    #[arg(long)]
    pub once: bool,

    /// Instruments to poll (comma-separated, overrides config)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub instruments: Vec<String>,
}

#[derive(clap::Args)]
pub struct HandleArgs {
    /// Delivery JSON file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Topic of a bare payload (e.g. new-trade-event)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Route triggers to simulated brokers
    #[arg(long)]
    pub simulated: bool,
}
