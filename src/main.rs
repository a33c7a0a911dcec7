//! Trading pipeline CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use trading_config::{load_config, AppConfig};
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(&cli.config).await;
    }

    let config = load_or_default(&cli)?;

    let mut logging = config.logging.clone();
    if let Some(level) = cli.log_level {
        logging.level = level.as_str().to_string();
    }
    if cli.json_logs {
        logging.format = "json".to_string();
    }
    let _log_guard = setup_logging(&logging)?;

    match cli.command {
        Commands::Route(args) => cli::commands::route::run(args, &config).await,
        Commands::Metrics(args) => cli::commands::metrics::run(args, &config).await,
        Commands::Produce(args) => cli::commands::produce::run(args, &config).await,
        Commands::Handle(args) => cli::commands::handle::run(args, &config).await,
        Commands::ValidateConfig => Ok(()),
    }
}

/// The default config path may be absent for local runs; an explicit one may not.
fn load_or_default(cli: &Cli) -> Result<AppConfig> {
    if !cli.config.exists() && cli.config == std::path::Path::new("config/default.toml") {
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }
    Ok(load_config(&cli.config)?)
}
