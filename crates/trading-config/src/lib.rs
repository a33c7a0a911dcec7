//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BrokerSettings, BusKind, BusSettings, CiSettings, CloudSettings,
    IgSettings, LoggingConfig, MarketDataSettings, PriceProvider, RouterSettings, SecretSettings,
    SecretSource, TopicSettings,
};

use config::{Config, Environment, File};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from file and environment.
///
/// Environment variables override the file: `TRADING__ROUTER__DISPATCH_TIMEOUT_SECS=5`.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("market_data.instruments"),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

impl AppConfig {
    /// Reject configurations no component could start with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Invalid(msg));

        if self.cloud.region.trim().is_empty() {
            return invalid("cloud.region must not be empty".to_string());
        }
        if self.cloud.account_id.trim().is_empty() {
            return invalid("cloud.account_id must not be empty".to_string());
        }
        if let Some((topic, _)) = self.topics.entries().into_iter().find(|(_, id)| id.trim().is_empty()) {
            return invalid(format!("topic identifier for {} must not be empty", topic));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return invalid(format!("logging.format must be pretty or json, got {}", self.logging.format));
        }

        match self.secrets.source {
            SecretSource::File if self.secrets.path.is_none() => {
                return invalid("secrets.path is required for the file source".to_string())
            }
            SecretSource::Env if self.secrets.var.is_none() => {
                return invalid("secrets.var is required for the env source".to_string())
            }
            _ => {}
        }
        if self.secrets.credentials_name.trim().is_empty() {
            return invalid("secrets.credentials_name must not be empty".to_string());
        }

        if self.router.dispatch_timeout_secs == 0 {
            return invalid("router.dispatch_timeout_secs must be > 0".to_string());
        }
        if self.brokers.ig.timeout_secs == 0 || self.brokers.ci.timeout_secs == 0 {
            return invalid("broker timeouts must be > 0".to_string());
        }
        if self.bus.kind == BusKind::Http && self.bus.endpoint.is_none() {
            return invalid("bus.endpoint is required for the http bus".to_string());
        }

        self.metrics
            .validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;

        if self.market_data.instruments.is_empty() {
            return invalid("market_data.instruments must not be empty".to_string());
        }
        if self.market_data.provider == PriceProvider::Csv && self.market_data.csv_path.is_none() {
            return invalid("market_data.csv_path is required for the csv provider".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trading_core::Topic;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_file() {
        let file = write_config(
            r#"
[app]
name = "trade-execution"
environment = "prod"

[cloud]
region = "ap-southeast-2"
account_id = "123456789012"

[topics]
trade_broker_response = "arn:aws:sns:ap-southeast-2:123456789012:trade-broker-response-A1"

[secrets]
source = "env"
var = "CUSTOMER_BROKER_CREDENTIALS"

[metrics]
rsi_period = 10

[market_data]
instruments = ["BHP", "CBA"]
resolution = "MINUTE_30"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.app.name, "trade-execution");
        assert_eq!(config.cloud.account_id, "123456789012");
        assert_eq!(config.secrets.source, SecretSource::Env);
        assert_eq!(config.metrics.rsi_period, 10);
        assert_eq!(config.metrics.macd_slow, 26);
        assert_eq!(config.market_data.instruments, vec!["BHP", "CBA"]);
        assert_eq!(config.market_data.resolution, trading_core::Resolution::Minute30);

        let table = config.topics.topic_table();
        assert_eq!(
            table.identifier(Topic::TradeBrokerResponse),
            Some("arn:aws:sns:ap-southeast-2:123456789012:trade-broker-response-A1")
        );
        assert_eq!(table.identifier(Topic::NewTradeEvent), Some("new-trade-event"));
    }

    #[test]
    fn test_env_override() {
        let file = write_config("[router]\ndispatch_timeout_secs = 30\n");
        std::env::set_var("TRADING__ROUTER__DISPATCH_TIMEOUT_SECS", "5");
        let config = load_config(file.path());
        std::env::remove_var("TRADING__ROUTER__DISPATCH_TIMEOUT_SECS");

        assert_eq!(config.unwrap().router.dispatch_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = AppConfig::default();
        config.cloud.account_id = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.topics.new_trade = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.router.dispatch_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.metrics.macd_fast = 30;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.bus.kind = BusKind::Http;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/trading.toml")),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn test_default_config_serializes_to_toml() {
        let rendered = toml::to_string(&AppConfig::default()).unwrap();
        assert!(rendered.contains("[router]"));
        assert!(rendered.contains("dispatch_timeout_secs = 30"));
    }
}
