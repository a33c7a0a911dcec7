//! Standard-metrics computation over a market-data window.

use chrono::Datelike;
use trading_core::traits::{Indicator, MultiOutputIndicator};
use trading_core::{Bar, MetricEvent, Resolution, StandardMetrics, TickSnapshots};
use trading_indicators::aggregates::{count_above, cumsum_since_sign_change, trailing_sum};
use trading_indicators::{AwesomeOscillator, Ema, Macd, Rsi, Sma, Stochastic, WilliamsR};

use crate::config::MetricsConfig;
use crate::error::{MetricsError, MetricsResult};

/// Bars for one instrument at both tick resolutions, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct MarketDataWindow<'a> {
    pub instrument: &'a str,
    /// Serialized event that completed this window
    pub input_event: &'a str,
    pub ten_minute: &'a [Bar],
    pub thirty_minute: &'a [Bar],
}

/// Computes [`MetricEvent`]s. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct MetricsComputer {
    config: MetricsConfig,
}

impl Default for MetricsComputer {
    fn default() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }
}

impl MetricsComputer {
    pub fn new(config: MetricsConfig) -> MetricsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute the metric event for the newest bar of each resolution.
    ///
    /// Fails with [`MetricsError::InsufficientHistory`] when either series is
    /// too short to populate all three snapshots.
    pub fn compute_tick(&self, window: &MarketDataWindow<'_>) -> MetricsResult<MetricEvent> {
        Ok(MetricEvent {
            instrument: window.instrument.to_string(),
            input_event: window.input_event.to_string(),
            tick_10_min: self.snapshots(window.ten_minute, Resolution::Minute10)?,
            tick_30_min: self.snapshots(window.thirty_minute, Resolution::Minute30)?,
        })
    }

    fn snapshots(&self, bars: &[Bar], resolution: Resolution) -> MetricsResult<TickSnapshots> {
        let required = self.config.required_history().max(3);
        if bars.len() < required {
            return Err(MetricsError::InsufficientHistory {
                resolution,
                required,
                available: bars.len(),
            });
        }

        let n = bars.len();
        Ok(TickSnapshots {
            t0: self.snapshot(&bars[..n], resolution)?,
            t_minus1: self.snapshot(&bars[..n - 1], resolution)?,
            t_minus2: self.snapshot(&bars[..n - 2], resolution)?,
        })
    }

    /// Standard metrics for the last bar of `bars`.
    pub fn snapshot(&self, bars: &[Bar], resolution: Resolution) -> MetricsResult<StandardMetrics> {
        let insufficient = || MetricsError::InsufficientHistory {
            resolution,
            required: self.config.warmup(),
            available: bars.len(),
        };
        let last = bars.last().ok_or_else(insufficient)?;
        let c = &self.config;

        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

        let ema26 = Ema::new(26).latest(&close).ok_or_else(insufficient)?;

        let macd = Macd::with_periods(c.macd_fast, c.macd_slow, c.macd_signal).calculate(&close);
        let histogram: Vec<f64> = macd.iter().map(|m| m.histogram).collect();
        let macd_last = macd.last().ok_or_else(insufficient)?;

        let stochastic = Stochastic::with_periods(c.stochastic_k, c.stochastic_d)
            .calculate_ohlc(&high, &low, &close);
        let stochastic_last = stochastic.last().ok_or_else(insufficient)?;

        let awesome = AwesomeOscillator::with_periods(c.awesome_fast, c.awesome_slow)
            .with_scale(c.awesome_scale)
            .calculate_hl(&high, &low);
        let aws = *awesome.last().ok_or_else(insufficient)?;

        let aws_count = count_above(&awesome, c.aggregate_window, c.awesome_threshold)
            .ok_or_else(insufficient)?;
        let macd_count = count_above(&histogram, c.aggregate_window, 0.0).ok_or_else(insufficient)?;

        let timestamp = last.timestamp;
        Ok(StandardMetrics {
            datetime: timestamp,
            snapshot_time_utc: timestamp,
            day_of_year: timestamp.ordinal(),
            week_number: timestamp.iso_week().week(),
            open_price: last.open,
            close_price: last.close,
            low_price: last.low,
            high_price: last.high,
            ema12: Ema::new(12).latest(&close).ok_or_else(insufficient)?,
            ema26,
            ema50: Ema::new(50).latest(&close).ok_or_else(insufficient)?,
            sma15: Sma::new(15).latest(&close).ok_or_else(insufficient)?,
            sma25: Sma::new(25).latest(&close).ok_or_else(insufficient)?,
            sma60: Sma::new(60).latest(&close).ok_or_else(insufficient)?,
            stochastic_k: stochastic_last.k,
            stochastic_d: stochastic_last.d,
            macd_d: macd_last.macd,
            macd_d_signal: macd_last.signal,
            macd_d_hist: macd_last.histogram,
            aws,
            rsi: Rsi::new(c.rsi_period).latest(&close).ok_or_else(insufficient)?,
            williams_r: WilliamsR::new(c.williams_period)
                .calculate_ohlc(&high, &low, &close)
                .pop()
                .ok_or_else(insufficient)?,
            macd_cumsum: cumsum_since_sign_change(&histogram).ok_or_else(insufficient)?,
            macd_cumsum36: trailing_sum(&histogram, c.aggregate_window).ok_or_else(insufficient)?,
            macd_cumsum_36_count_above_0: macd_count as f64,
            aws_count_above_50: aws_count as u32,
            gap_close_price_to_ema26: last.close - ema26,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(count: usize, step_minutes: i64) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let base = 0.65 + (i as f64 * 0.2).sin() * 0.01 + i as f64 * 0.0001;
                Bar::new(
                    start + Duration::minutes(step_minutes * i as i64),
                    base,
                    base + 0.002,
                    base - 0.002,
                    base + 0.0005,
                    100.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_fewer_than_three_samples_is_precondition_failure() {
        let computer = MetricsComputer::default();
        let bars = series(2, 10);
        let window = MarketDataWindow {
            instrument: "AUD/USD",
            input_event: "{}",
            ten_minute: &bars,
            thirty_minute: &bars,
        };

        let err = computer.compute_tick(&window).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::InsufficientHistory { available: 2, .. }
        ));
    }

    #[test]
    fn test_short_history_is_not_zero_filled() {
        let computer = MetricsComputer::default();
        let ten = series(200, 10);
        let thirty = series(100, 30);
        let window = MarketDataWindow {
            instrument: "AUD/USD",
            input_event: "{}",
            ten_minute: &ten,
            thirty_minute: &thirty,
        };

        match computer.compute_tick(&window) {
            Err(MetricsError::InsufficientHistory { resolution, required, available }) => {
                assert_eq!(resolution, Resolution::Minute30);
                assert_eq!(required, 101);
                assert_eq!(available, 100);
            }
            other => panic!("expected insufficient history, got {:?}", other),
        }
    }

    #[test]
    fn test_compute_tick_snapshots() {
        let computer = MetricsComputer::default();
        let ten = series(150, 10);
        let thirty = series(120, 30);
        let window = MarketDataWindow {
            instrument: "AUD/USD",
            input_event: "{\"instrument\":\"AUD/USD\"}",
            ten_minute: &ten,
            thirty_minute: &thirty,
        };

        let event = computer.compute_tick(&window).unwrap();
        let t0 = &event.tick_10_min.t0;
        let t1 = &event.tick_10_min.t_minus1;
        let t2 = &event.tick_10_min.t_minus2;

        assert_eq!(t0.datetime, ten[149].timestamp);
        assert_eq!(t1.datetime, ten[148].timestamp);
        assert_eq!(t2.datetime, ten[147].timestamp);
        assert_eq!(event.tick_30_min.t0.datetime, thirty[119].timestamp);

        assert!((t0.close_price - ten[149].close).abs() < 1e-12);
        assert!((t0.gap_close_price_to_ema26 - (t0.close_price - t0.ema26)).abs() < 1e-12);
        assert!((t0.macd_d_hist - (t0.macd_d - t0.macd_d_signal)).abs() < 1e-12);
        assert!((0.0..=100.0).contains(&t0.rsi));
        assert!((0.0..=100.0).contains(&t0.stochastic_k));
        assert!((-100.0..=0.0).contains(&t0.williams_r));
        assert!(t0.macd_cumsum_36_count_above_0 <= 36.0);
        assert!(t0.aws_count_above_50 <= 36);
        assert_eq!(t0.day_of_year, 306);
    }

    #[test]
    fn test_snapshot_matches_direct_indicators() {
        let computer = MetricsComputer::default();
        let bars = series(120, 10);
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let snapshot = computer.snapshot(&bars, Resolution::Minute10).unwrap();
        let sma15 = close[close.len() - 15..].iter().sum::<f64>() / 15.0;
        assert!((snapshot.sma15 - sma15).abs() < 1e-12);
    }

    #[test]
    fn test_event_serializes_with_wire_names() {
        let computer = MetricsComputer::default();
        let bars = series(110, 10);
        let window = MarketDataWindow {
            instrument: "EUR/USD",
            input_event: "{}",
            ten_minute: &bars,
            thirty_minute: &bars,
        };
        let value = serde_json::to_value(computer.compute_tick(&window).unwrap()).unwrap();

        let t0 = &value["tick_10_min"]["t0"];
        for field in ["snapshotTimeUTC", "dayOfYear", "williamsR", "macd_cumsum36", "gapClosePriceToEMA26"] {
            assert!(t0.get(field).is_some(), "missing {}", field);
        }
        assert!(value["tick_30_min"].get("tMinus2").is_some());
    }
}
