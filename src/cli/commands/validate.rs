//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Region: {}", config.cloud.region);
            println!("Log level: {}", config.logging.level);
            println!("Credentials secret: {}", config.secrets.credentials_name);
            println!("Dispatch timeout: {}s", config.router.dispatch_timeout_secs);
            println!("Simulated brokers: {}", config.brokers.simulated);
            println!("Instruments: {}", config.market_data.instruments.join(", "));
            for (topic, id) in config.topics.entries() {
                println!("Topic {}: {}", topic, id);
            }
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
