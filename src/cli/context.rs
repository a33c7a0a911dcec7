//! Component wiring from configuration.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::info;
use trading_broker::{AdapterRegistry, CiConfig, IgConfig};
use trading_bus::{HttpPublisher, InMemoryBus};
use trading_config::{AppConfig, BusKind, PriceProvider, SecretSource};
use trading_core::traits::{EventPublisher, PriceSource, SecretStore};
use trading_core::{Secret, Topic};
use trading_data::{CsvDataSource, EodConfig, EodHistoricalSource};
use trading_router::{EnvSecretStore, FileSecretStore, RouterConfig, TradeRouter};

/// The configured bus, plus the in-memory bus when that is what is configured
/// so published messages can be shown after a local run.
pub struct Bus {
    pub publisher: Arc<dyn EventPublisher>,
    memory: Option<InMemoryBus>,
}

impl Bus {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.bus.kind {
            BusKind::Memory => {
                let bus = InMemoryBus::new();
                Ok(Self {
                    publisher: Arc::new(bus.clone()),
                    memory: Some(bus),
                })
            }
            BusKind::Http => {
                let endpoint = config.bus.endpoint.clone().context("bus.endpoint is not set")?;
                let publisher = HttpPublisher::new(endpoint, config.topics.topic_table())?;
                Ok(Self {
                    publisher: Arc::new(publisher),
                    memory: None,
                })
            }
        }
    }

    /// Print every message published to the in-memory bus, one JSON per line.
    pub async fn print_published(&self) {
        let Some(bus) = &self.memory else {
            return;
        };
        for topic in Topic::all() {
            for message in bus.published(*topic).await {
                println!("{} {}", topic, message.payload);
            }
        }
    }
}

pub fn secret_store(config: &AppConfig) -> Result<Arc<dyn SecretStore>> {
    let secrets = &config.secrets;
    Ok(match secrets.source {
        SecretSource::File => {
            let path = secrets.path.clone().context("secrets.path is not set")?;
            Arc::new(FileSecretStore::new(path))
        }
        SecretSource::Env => {
            let var = secrets.var.clone().context("secrets.var is not set")?;
            Arc::new(EnvSecretStore::new(var))
        }
    })
}

pub fn adapters(config: &AppConfig, simulated: bool) -> Result<AdapterRegistry> {
    if simulated || config.brokers.simulated {
        info!("Using simulated brokers");
        return Ok(AdapterRegistry::simulated());
    }
    let ig = &config.brokers.ig;
    let ci = &config.brokers.ci;
    let registry = AdapterRegistry::live(
        IgConfig {
            base_url: ig.base_url.clone(),
            api_version: ig.api_version.clone(),
            timeout_secs: ig.timeout_secs,
        },
        CiConfig {
            base_url: ci.base_url.clone(),
            app_version: ci.app_version.clone(),
            timeout_secs: ci.timeout_secs,
        },
    )?;
    Ok(registry)
}

pub fn router(config: &AppConfig, bus: &Bus, simulated: bool) -> Result<TradeRouter> {
    Ok(TradeRouter::new(
        secret_store(config)?,
        adapters(config, simulated)?,
        Arc::clone(&bus.publisher),
        RouterConfig {
            credentials_name: config.secrets.credentials_name.clone(),
            dispatch_timeout: Duration::from_secs(config.router.dispatch_timeout_secs),
            dedupe_redeliveries: config.router.dedupe_redeliveries,
            service_name: config.router.service_name.clone(),
        },
    ))
}

pub fn price_source(config: &AppConfig) -> Result<Arc<dyn PriceSource>> {
    let settings = &config.market_data;
    Ok(match settings.provider {
        PriceProvider::Csv => {
            let path = settings.csv_path.clone().context("market_data.csv_path is not set")?;
            Arc::new(CsvDataSource::new(path)?)
        }
        PriceProvider::Eod => {
            let api_key = std::env::var(&settings.api_key_env)
                .with_context(|| format!("{} is not set", settings.api_key_env))?;
            Arc::new(EodHistoricalSource::new(EodConfig {
                base_url: settings.base_url.clone(),
                api_key: Secret::new(api_key),
                exchange: settings.exchange.clone(),
                ..EodConfig::default()
            })?)
        }
    })
}

/// Read a file, or stdin for `-`.
pub async fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        return Ok(raw);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
