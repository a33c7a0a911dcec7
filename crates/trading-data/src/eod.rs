//! EOD Historical Data price source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use trading_core::error::DataError;
use trading_core::traits::PriceSource;
use trading_core::{MarketDataEvent, Resolution, Secret};

use crate::resample::{base_resolution, resample};

#[derive(Debug, Clone)]
pub struct EodConfig {
    pub base_url: String,
    pub api_key: Secret,
    /// Exchange suffix for non-FX instruments, e.g. `AU`
    pub exchange: String,
    pub timeout_secs: u64,
}

impl Default for EodConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eodhd.com".to_string(),
            api_key: Secret::default(),
            exchange: "AU".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntradayRow {
    timestamp: i64,
    open: Option<Decimal>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    close: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    date: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    #[serde(default)]
    volume: Option<Decimal>,
}

/// Fetches bars from the EOD Historical Data REST API.
///
/// Resolutions the intraday endpoint does not serve directly (10 and 30
/// minutes) are built from 5-minute bars.
pub struct EodHistoricalSource {
    config: EodConfig,
    client: Client,
}

impl EodHistoricalSource {
    pub fn new(config: EodConfig) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// `AUD/USD` becomes `AUDUSD.FOREX`, `BHP` becomes `BHP.<exchange>`.
    pub fn ticker(&self, instrument: &str) -> String {
        let symbol: String = instrument
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_uppercase();
        let exchange = if instrument.contains('/') {
            "FOREX"
        } else {
            self.config.exchange.as_str()
        };
        format!("{}.{}", symbol, exchange)
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
        instrument: &str,
    ) -> Result<T, DataError> {
        let resp = self
            .client
            .get(url)
            .query(&[("api_token", self.config.api_key.expose()), ("fmt", "json")])
            .query(query)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(DataError::InstrumentNotFound(instrument.to_string())),
            status => {
                let text = resp.text().await.unwrap_or_default();
                warn!(%instrument, %status, "EOD request failed");
                return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
            }
        }

        resp.json().await.map_err(|e| DataError::ParseError(e.to_string()))
    }

    async fn fetch_intraday(
        &self,
        instrument: &str,
        resolution: Resolution,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MarketDataEvent>, DataError> {
        let interval = resolution
            .eod_interval()
            .ok_or_else(|| DataError::InvalidResolution(resolution.to_string()))?;
        let url = format!("{}/api/intraday/{}", self.config.base_url, self.ticker(instrument));

        let mut query = vec![("interval", interval.to_string())];
        if let Some(since) = since {
            query.push(("from", since.timestamp().to_string()));
        }

        let rows: Vec<IntradayRow> = self.get(&url, &query, instrument).await?;
        let insert_stamp = Utc::now();

        let events = rows
            .into_iter()
            .filter_map(|row| {
                // The feed emits empty rows outside trading hours
                let (open, high, low, close) = (row.open?, row.high?, row.low?, row.close?);
                let at = Utc.timestamp_opt(row.timestamp, 0).single()?;
                Some(MarketDataEvent {
                    instrument: instrument.to_string(),
                    datetime: at,
                    snapshot_time_utc: at,
                    resolution,
                    open_price: open,
                    close_price: close,
                    high_price: high,
                    low_price: low,
                    volume: row.volume.unwrap_or_default(),
                    insert_stamp,
                })
            })
            .collect();
        Ok(events)
    }

    async fn fetch_daily(
        &self,
        instrument: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MarketDataEvent>, DataError> {
        let url = format!("{}/api/eod/{}", self.config.base_url, self.ticker(instrument));
        let mut query = vec![("period", "d".to_string())];
        if let Some(since) = since {
            query.push(("from", since.format("%Y-%m-%d").to_string()));
        }

        let rows: Vec<DailyRow> = self.get(&url, &query, instrument).await?;
        let insert_stamp = Utc::now();

        rows.into_iter()
            .map(|row| {
                let at = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
                    .ok_or_else(|| DataError::ParseError(format!("bad date {}", row.date)))?;
                Ok(MarketDataEvent {
                    instrument: instrument.to_string(),
                    datetime: at,
                    snapshot_time_utc: at,
                    resolution: Resolution::Daily,
                    open_price: row.open,
                    close_price: row.close,
                    high_price: row.high,
                    low_price: row.low,
                    volume: row.volume.unwrap_or_default(),
                    insert_stamp,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PriceSource for EodHistoricalSource {
    async fn fetch_bars(
        &self,
        instrument: &str,
        resolution: Resolution,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MarketDataEvent>, DataError> {
        debug!(%instrument, %resolution, ?since, "Fetching EOD bars");

        let mut events = match (resolution, base_resolution(resolution)) {
            (Resolution::Daily, _) => self.fetch_daily(instrument, since).await?,
            (_, Some(base)) => {
                let fine = self.fetch_intraday(instrument, base, since).await?;
                resample(&fine, resolution)
            }
            (_, None) => self.fetch_intraday(instrument, resolution, since).await?,
        };

        events.sort_by_key(|e| e.snapshot_time_utc);
        if let Some(since) = since {
            events.retain(|e| e.snapshot_time_utc > since);
        }
        Ok(events)
    }

    fn name(&self) -> &str {
        "EOD Historical Data"
    }
}
