//! Configuration structures.

use serde::{Deserialize, Serialize};
use trading_core::{Resolution, Topic, TopicTable};
use trading_metrics::MetricsConfig;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cloud: CloudSettings,
    #[serde(default)]
    pub topics: TopicSettings,
    #[serde(default)]
    pub secrets: SecretSettings,
    #[serde(default)]
    pub brokers: BrokerSettings,
    #[serde(default)]
    pub router: RouterSettings,
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub market_data: MarketDataSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-pipeline".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for daily-rolling log files
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Deployment account and region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSettings {
    pub region: String,
    pub account_id: String,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            region: "ap-southeast-2".to_string(),
            account_id: "000000000000".to_string(),
        }
    }
}

/// Deployed identifier (e.g. ARN) of each topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicSettings {
    pub new_market_data: String,
    pub new_metric: String,
    pub new_trade: String,
    pub trade_broker_response: String,
    pub generic_error: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            new_market_data: Topic::NewMarketDataEvent.name().to_string(),
            new_metric: Topic::NewMetricEvent.name().to_string(),
            new_trade: Topic::NewTradeEvent.name().to_string(),
            trade_broker_response: Topic::TradeBrokerResponse.name().to_string(),
            generic_error: Topic::GenericErrorEvent.name().to_string(),
        }
    }
}

impl TopicSettings {
    pub fn entries(&self) -> [(Topic, &str); 5] {
        [
            (Topic::NewMarketDataEvent, self.new_market_data.as_str()),
            (Topic::NewMetricEvent, self.new_metric.as_str()),
            (Topic::NewTradeEvent, self.new_trade.as_str()),
            (Topic::TradeBrokerResponse, self.trade_broker_response.as_str()),
            (Topic::GenericErrorEvent, self.generic_error.as_str()),
        ]
    }

    pub fn topic_table(&self) -> TopicTable {
        self.entries()
            .into_iter()
            .fold(TopicTable::new(), |table, (topic, id)| table.with(topic, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
    /// A JSON file, or a directory of `<name>.json` files
    File,
    /// An environment variable holding the JSON
    Env,
}

/// Where the customer credential secret lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretSettings {
    pub credentials_name: String,
    pub source: SecretSource,
    pub path: Option<String>,
    pub var: Option<String>,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            credentials_name: "customer-broker-credentials".to_string(),
            source: SecretSource::File,
            path: Some("secrets".to_string()),
            var: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BrokerSettings {
    pub ig: IgSettings,
    pub ci: CiSettings,
    /// Use the simulated broker for every account
    pub simulated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgSettings {
    pub base_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for IgSettings {
    fn default() -> Self {
        Self {
            base_url: "https://demo-api.ig.com/gateway/deal".to_string(),
            api_version: "2".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CiSettings {
    pub base_url: String,
    pub app_version: String,
    pub timeout_secs: u64,
}

impl Default for CiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://ciapi.cityindex.com/TradingAPI".to_string(),
            app_version: "1".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    pub dispatch_timeout_secs: u64,
    pub dedupe_redeliveries: bool,
    pub service_name: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            dispatch_timeout_secs: 30,
            dedupe_redeliveries: true,
            service_name: "trade-router".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    Memory,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub kind: BusKind,
    pub endpoint: Option<String>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            kind: BusKind::Memory,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    Eod,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataSettings {
    pub provider: PriceProvider,
    pub base_url: String,
    /// Environment variable holding the EOD API token
    pub api_key_env: String,
    pub exchange: String,
    pub instruments: Vec<String>,
    pub resolution: Resolution,
    pub csv_path: Option<String>,
    /// Persists publish marks across restarts
    pub state_file: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            provider: PriceProvider::Eod,
            base_url: "https://eodhd.com".to_string(),
            api_key_env: "EOD_API_KEY".to_string(),
            exchange: "AU".to_string(),
            instruments: vec!["AUD/USD".to_string(), "EUR/USD".to_string(), "USD/JPY".to_string()],
            resolution: Resolution::Minute10,
            csv_path: None,
            state_file: None,
            poll_interval_secs: 600,
        }
    }
}
