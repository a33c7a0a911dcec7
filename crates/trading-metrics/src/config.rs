//! Indicator parameters for the metrics computer.

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Indicator periods. Moving-average periods are fixed by the metric field
/// names (`ema12`, `sma60`, ...) and are not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub williams_period: usize,
    pub awesome_fast: usize,
    pub awesome_slow: usize,
    /// Multiplier applied to the awesome oscillator (points to pips)
    pub awesome_scale: f64,
    /// Trailing window for `macd_cumsum36` and the above-threshold counts
    pub aggregate_window: usize,
    pub awesome_threshold: f64,
    /// Bars retained per instrument and resolution
    pub history_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            stochastic_k: 14,
            stochastic_d: 3,
            williams_period: 14,
            awesome_fast: 4,
            awesome_slow: 64,
            awesome_scale: 10_000.0,
            aggregate_window: 36,
            awesome_threshold: 50.0,
            history_capacity: 500,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<(), MetricsError> {
        let periods = [
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("stochastic_k", self.stochastic_k),
            ("stochastic_d", self.stochastic_d),
            ("williams_period", self.williams_period),
            ("awesome_fast", self.awesome_fast),
            ("awesome_slow", self.awesome_slow),
            ("aggregate_window", self.aggregate_window),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(MetricsError::InvalidConfig(format!("{} must be > 0", name)));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(MetricsError::InvalidConfig(
                "macd_fast must be less than macd_slow".to_string(),
            ));
        }
        if self.awesome_fast >= self.awesome_slow {
            return Err(MetricsError::InvalidConfig(
                "awesome_fast must be less than awesome_slow".to_string(),
            ));
        }
        if self.history_capacity < self.required_history() {
            return Err(MetricsError::InvalidConfig(format!(
                "history_capacity {} cannot hold the {} bars a tick needs",
                self.history_capacity,
                self.required_history()
            )));
        }
        Ok(())
    }

    /// Bars needed for one fully-populated snapshot.
    pub fn warmup(&self) -> usize {
        let macd_first = self.macd_slow + self.macd_signal - 2;
        [
            60, // sma60
            50, // ema50
            (macd_first + self.aggregate_window).max(self.macd_slow + self.macd_signal),
            self.awesome_slow - 1 + self.aggregate_window,
            self.rsi_period + 1,
            self.stochastic_k + self.stochastic_d - 1,
            self.williams_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(60)
    }

    /// Bars needed for the t0, t-1 and t-2 snapshots.
    pub fn required_history(&self) -> usize {
        self.warmup() + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_warmup() {
        let config = MetricsConfig::default();
        // awesome slow 64 plus 36 trailing values dominates
        assert_eq!(config.warmup(), 99);
        assert_eq!(config.required_history(), 101);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_periods() {
        let config = MetricsConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_history() {
        let config = MetricsConfig {
            history_capacity: 50,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MetricsError::InvalidConfig(_))));
    }
}
