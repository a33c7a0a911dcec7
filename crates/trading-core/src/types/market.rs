//! Market data types: resolutions, price bars and the market-data event.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Bar resolution as carried on the wire (`MINUTE_10`, `MINUTE_30`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "MINUTE")]
    Minute1,
    #[serde(rename = "MINUTE_5")]
    Minute5,
    #[serde(rename = "MINUTE_10")]
    Minute10,
    #[serde(rename = "MINUTE_15")]
    Minute15,
    #[serde(rename = "MINUTE_30")]
    Minute30,
    #[serde(rename = "HOUR")]
    Hour1,
    #[serde(rename = "HOUR_4")]
    Hour4,
    #[serde(rename = "DAY")]
    Daily,
}

impl Resolution {
    /// Duration of one bar in seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Resolution::Minute1 => 60,
            Resolution::Minute5 => 300,
            Resolution::Minute10 => 600,
            Resolution::Minute15 => 900,
            Resolution::Minute30 => 1800,
            Resolution::Hour1 => 3600,
            Resolution::Hour4 => 14400,
            Resolution::Daily => 86400,
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Resolution::Daily)
    }

    /// Interval parameter understood by the EOD Historical intraday API.
    pub fn eod_interval(&self) -> Option<&'static str> {
        match self {
            Resolution::Minute1 => Some("1m"),
            Resolution::Minute5 => Some("5m"),
            Resolution::Hour1 => Some("1h"),
            _ => None,
        }
    }

    pub fn all() -> &'static [Resolution] {
        &[
            Resolution::Minute1,
            Resolution::Minute5,
            Resolution::Minute10,
            Resolution::Minute15,
            Resolution::Minute30,
            Resolution::Hour1,
            Resolution::Hour4,
            Resolution::Daily,
        ]
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::Minute1 => "MINUTE",
            Resolution::Minute5 => "MINUTE_5",
            Resolution::Minute10 => "MINUTE_10",
            Resolution::Minute15 => "MINUTE_15",
            Resolution::Minute30 => "MINUTE_30",
            Resolution::Hour1 => "HOUR",
            Resolution::Hour4 => "HOUR_4",
            Resolution::Daily => "DAY",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MINUTE" | "MINUTE_1" | "1M" => Ok(Resolution::Minute1),
            "MINUTE_5" | "5M" => Ok(Resolution::Minute5),
            "MINUTE_10" | "10M" => Ok(Resolution::Minute10),
            "MINUTE_15" | "15M" => Ok(Resolution::Minute15),
            "MINUTE_30" | "30M" => Ok(Resolution::Minute30),
            "HOUR" | "HOUR_1" | "1H" => Ok(Resolution::Hour1),
            "HOUR_4" | "4H" => Ok(Resolution::Hour4),
            "DAY" | "1D" | "DAILY" => Ok(Resolution::Daily),
            _ => Err(format!("Invalid resolution: {}", s)),
        }
    }
}

/// Compact price bar used for indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Snapshot time of the bar
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Midpoint of the bar's range, the input of the awesome oscillator.
    #[inline]
    pub fn median_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Market-data event published on `new-market-data-event`.
///
/// Prices are decimals; the upstream feed sends them as JSON strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataEvent {
    pub instrument: String,
    /// Exchange-local bar time
    pub datetime: DateTime<Utc>,
    #[serde(rename = "snapshotTimeUTC")]
    pub snapshot_time_utc: DateTime<Utc>,
    pub resolution: Resolution,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    #[serde(default)]
    pub volume: Decimal,
    pub insert_stamp: DateTime<Utc>,
}

impl MarketDataEvent {
    /// Reject bars whose prices are inconsistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.instrument.trim().is_empty() {
            return Err("instrument must not be empty".to_string());
        }
        if self.high_price < self.low_price {
            return Err(format!(
                "{}: highPrice {} below lowPrice {}",
                self.instrument, self.high_price, self.low_price
            ));
        }
        for (name, price) in [
            ("openPrice", self.open_price),
            ("closePrice", self.close_price),
            ("highPrice", self.high_price),
            ("lowPrice", self.low_price),
        ] {
            if price <= Decimal::ZERO {
                return Err(format!("{}: {} must be positive", self.instrument, name));
            }
        }
        Ok(())
    }

    /// Convert to an f64 bar keyed on the UTC snapshot time.
    pub fn to_bar(&self) -> Bar {
        Bar::new(
            self.snapshot_time_utc,
            self.open_price.to_f64().unwrap_or_default(),
            self.high_price.to_f64().unwrap_or_default(),
            self.low_price.to_f64().unwrap_or_default(),
            self.close_price.to_f64().unwrap_or_default(),
            self.volume.to_f64().unwrap_or_default(),
        )
    }
}

/// Bounded, time-ordered bar buffer.
///
/// Bars are kept sorted by timestamp. A bar with a timestamp already present
/// replaces the stored one; late bars are inserted at their ordered position.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub instrument: String,
    pub resolution: Resolution,
    bars: VecDeque<Bar>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

/// What happened when a bar was offered to a [`BarSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarInsert {
    Appended,
    /// Arrived out of order and was placed behind newer bars
    Backfilled,
    /// Same timestamp as a stored bar; the stored bar was replaced
    Replaced,
    /// Older than everything retained in a full buffer
    Dropped,
}

impl BarSeries {
    pub fn new(instrument: impl Into<String>, resolution: Resolution) -> Self {
        Self::with_capacity(instrument, resolution, 0)
    }

    /// When capacity is reached, oldest bars are removed.
    pub fn with_capacity(instrument: impl Into<String>, resolution: Resolution, capacity: usize) -> Self {
        Self {
            instrument: instrument.into(),
            resolution,
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, bar: Bar) -> BarInsert {
        let pos = self.bars.partition_point(|b| b.timestamp < bar.timestamp);

        if let Some(existing) = self.bars.get_mut(pos) {
            if existing.timestamp == bar.timestamp {
                *existing = bar;
                return BarInsert::Replaced;
            }
        }

        let full = self.capacity > 0 && self.bars.len() >= self.capacity;
        if full && pos == 0 {
            return BarInsert::Dropped;
        }

        let outcome = if pos == self.bars.len() {
            BarInsert::Appended
        } else {
            BarInsert::Backfilled
        };

        self.bars.insert(pos, bar);
        if full {
            self.bars.pop_front();
        }
        outcome
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// The stored bar at exactly `timestamp`.
    pub fn get(&self, timestamp: DateTime<Utc>) -> Option<&Bar> {
        let pos = self.bars.partition_point(|b| b.timestamp < timestamp);
        self.bars.get(pos).filter(|b| b.timestamp == timestamp)
    }

    /// Copy the retained bars, oldest first.
    pub fn to_vec(&self) -> Vec<Bar> {
        self.bars.iter().copied().collect()
    }
}
