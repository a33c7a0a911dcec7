//! CSV price source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::PriceSource;
use trading_core::{MarketDataEvent, Resolution};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "datetime",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "snapshotTimeUTC"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open", alias = "openPrice")]
    open: Decimal,
    #[serde(alias = "High", alias = "high", alias = "highPrice")]
    high: Decimal,
    #[serde(alias = "Low", alias = "low", alias = "lowPrice")]
    low: Decimal,
    #[serde(alias = "Close", alias = "close", alias = "closePrice", alias = "Adj Close")]
    close: Decimal,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: Decimal,
}

/// Price source reading exported bars from CSV files.
///
/// `path` is either one file holding every bar, or a directory of
/// `<INSTRUMENT>_<RESOLUTION>.csv` files (e.g. `AUDUSD_MINUTE_10.csv`).
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self { path })
    }

    fn file_for(&self, instrument: &str, resolution: Resolution) -> PathBuf {
        if self.path.is_dir() {
            let symbol: String = instrument.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            self.path.join(format!("{}_{}.csv", symbol.to_uppercase(), resolution))
        } else {
            self.path.clone()
        }
    }

    fn load_from_path(
        &self,
        path: &Path,
        instrument: &str,
        resolution: Resolution,
    ) -> Result<Vec<MarketDataEvent>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| match e.kind() {
                csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    DataError::InstrumentNotFound(instrument.to_string())
                }
                _ => DataError::ParseError(e.to_string()),
            })?;

        let insert_stamp = Utc::now();
        let mut events = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let timestamp = parse_timestamp(&record.date)?;

            events.push(MarketDataEvent {
                instrument: instrument.to_string(),
                datetime: timestamp,
                snapshot_time_utc: timestamp,
                resolution,
                open_price: record.open,
                close_price: record.close,
                high_price: record.high,
                low_price: record.low,
                volume: record.volume,
                insert_stamp,
            });
        }

        events.sort_by_key(|e| e.snapshot_time_utc);
        Ok(events)
    }
}

#[async_trait]
impl PriceSource for CsvDataSource {
    async fn fetch_bars(
        &self,
        instrument: &str,
        resolution: Resolution,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MarketDataEvent>, DataError> {
        let path = self.file_for(instrument, resolution);
        debug!(path = %path.display(), %instrument, %resolution, "Reading CSV bars");

        let mut events = self.load_from_path(&path, instrument, resolution)?;
        if let Some(since) = since {
            events.retain(|e| e.snapshot_time_utc > since);
        }
        Ok(events)
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

/// Parse the timestamp formats seen in exported price files.
pub(crate) fn parse_timestamp(date_str: &str) -> Result<DateTime<Utc>, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];
    for format in date_formats {
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc());
        }
    }

    // Unix seconds or milliseconds
    if let Ok(ts) = date_str.parse::<i64>() {
        let millis = if ts > 10_000_000_000 { ts } else { ts * 1000 };
        if let Some(dt) = Utc.timestamp_millis_opt(millis).single() {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", date_str)))
}
