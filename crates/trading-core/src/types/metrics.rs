//! Metric event published on `new-metric-event`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The standard-metrics record computed for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardMetrics {
    pub datetime: DateTime<Utc>,
    #[serde(rename = "snapshotTimeUTC")]
    pub snapshot_time_utc: DateTime<Utc>,
    pub day_of_year: u32,
    pub week_number: u32,
    pub open_price: f64,
    pub close_price: f64,
    pub low_price: f64,
    pub high_price: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub ema50: f64,
    pub sma15: f64,
    pub sma25: f64,
    pub sma60: f64,
    #[serde(rename = "stochastic_k")]
    pub stochastic_k: f64,
    #[serde(rename = "stochastic_d")]
    pub stochastic_d: f64,
    #[serde(rename = "macd_d")]
    pub macd_d: f64,
    #[serde(rename = "macd_d_signal")]
    pub macd_d_signal: f64,
    #[serde(rename = "macd_d_hist")]
    pub macd_d_hist: f64,
    pub aws: f64,
    pub rsi: f64,
    pub williams_r: f64,
    #[serde(rename = "macd_cumsum")]
    pub macd_cumsum: f64,
    #[serde(rename = "macd_cumsum36")]
    pub macd_cumsum36: f64,
    #[serde(rename = "macd_cumsum_36_count_above_0")]
    pub macd_cumsum_36_count_above_0: f64,
    #[serde(rename = "aws_count_above_50")]
    pub aws_count_above_50: u32,
    #[serde(rename = "gapClosePriceToEMA26")]
    pub gap_close_price_to_ema26: f64,
}

/// Current bar and the two before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshots {
    pub t0: StandardMetrics,
    pub t_minus1: StandardMetrics,
    pub t_minus2: StandardMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    pub instrument: String,
    /// Serialized market-data event that produced this metric event
    pub input_event: String,
    #[serde(rename = "tick_10_min")]
    pub tick_10_min: TickSnapshots,
    #[serde(rename = "tick_30_min")]
    pub tick_30_min: TickSnapshots,
}
