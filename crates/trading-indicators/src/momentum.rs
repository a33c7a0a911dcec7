//! Momentum indicators.

use crate::moving_average::{Ema, Sma};
use serde::{Deserialize, Serialize};
use trading_core::traits::{Indicator, MultiOutputIndicator};

/// Relative Strength Index (RSI).
///
/// Average gains and losses are simple rolling means over the period.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.period {
            return vec![];
        }

        let mut gains = Vec::with_capacity(data.len() - 1);
        let mut losses = Vec::with_capacity(data.len() - 1);

        for pair in data.windows(2) {
            let change = pair[1] - pair[0];
            gains.push(change.max(0.0));
            losses.push((-change).max(0.0));
        }

        let sma = Sma::new(self.period);
        let avg_gains = sma.calculate(&gains);
        let avg_losses = sma.calculate(&losses);

        avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if loss == 0.0 {
                    if gain == 0.0 {
                        50.0
                    } else {
                        100.0
                    }
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period + 1 // Need period+1 data points
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD (Moving Average Convergence Divergence) output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (EMA of MACD)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// MACD indicator.
///
/// Uses two EMAs to identify trend direction and momentum.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// Create a new MACD with default parameters (12, 26, 9).
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    /// Create a MACD with custom periods.
    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<MacdOutput> {
        if data.len() < self.slow_period + self.signal_period {
            return vec![];
        }

        // Calculate EMAs
        let fast_ema = Ema::new(self.fast_period).calculate(data);
        let slow_ema = Ema::new(self.slow_period).calculate(data);

        // Align the EMAs (fast has more values)
        let offset = self.slow_period - self.fast_period;
        let fast_ema = &fast_ema[offset..];

        // Calculate MACD line
        let macd_line: Vec<f64> = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        if macd_line.len() < self.signal_period {
            return vec![];
        }

        // Calculate signal line (EMA of MACD)
        let signal_line = Ema::new(self.signal_period).calculate(&macd_line);

        // Align and create output
        let offset = self.signal_period - 1;
        macd_line[offset..]
            .iter()
            .zip(signal_line.iter())
            .map(|(&macd, &signal)| MacdOutput {
                macd,
                signal,
                histogram: macd - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Stochastic oscillator output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochasticOutput {
    /// %K (fast stochastic)
    pub k: f64,
    /// %D (slow stochastic / signal)
    pub d: f64,
}

/// Stochastic oscillator.
///
/// Compares closing price to the price range over a period.
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Stochastic {
    /// Create a new stochastic oscillator with default parameters (14, 3).
    pub fn new() -> Self {
        Self::with_periods(14, 3)
    }

    /// Create with custom periods.
    pub fn with_periods(k_period: usize, d_period: usize) -> Self {
        assert!(k_period > 0 && d_period > 0);
        Self { k_period, d_period }
    }

    /// Calculate stochastic from OHLC data.
    pub fn calculate_ohlc(
        &self,
        high: &[f64],
        low: &[f64],
        close: &[f64],
    ) -> Vec<StochasticOutput> {
        let len = high.len().min(low.len()).min(close.len());
        if len < self.k_period + self.d_period - 1 {
            return vec![];
        }

        let k_values: Vec<f64> = rolling_extremes(&high[..len], &low[..len], self.k_period)
            .into_iter()
            .enumerate()
            .map(|(j, (highest, lowest))| {
                let range = highest - lowest;
                if range == 0.0 {
                    50.0 // Undefined, use midpoint
                } else {
                    ((close[j + self.k_period - 1] - lowest) / range) * 100.0
                }
            })
            .collect();

        if k_values.len() < self.d_period {
            return vec![];
        }

        // Calculate %D (SMA of %K)
        let mut result = Vec::with_capacity(k_values.len() - self.d_period + 1);
        let d_period_f64 = self.d_period as f64;

        for i in (self.d_period - 1)..k_values.len() {
            let k = k_values[i];
            let d: f64 = k_values[(i + 1 - self.d_period)..=i].iter().sum::<f64>() / d_period_f64;
            result.push(StochasticOutput { k, d });
        }

        result
    }
}

impl Default for Stochastic {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Stochastic {
    type Output = StochasticOutput;

    /// Calculate using close prices only (uses close as high/low approximation).
    fn calculate(&self, data: &[f64]) -> Vec<StochasticOutput> {
        // For close-only data, we use close as both high and low
        // This is a simplified version; prefer calculate_ohlc for accurate results
        self.calculate_ohlc(data, data, data)
    }

    fn period(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    fn name(&self) -> &str {
        "Stochastic"
    }
}

/// Highest high and lowest low of each trailing window of `period` bars.
fn rolling_extremes(high: &[f64], low: &[f64], period: usize) -> Vec<(f64, f64)> {
    let len = high.len().min(low.len());
    if period == 0 || len < period {
        return vec![];
    }
    (period - 1..len)
        .map(|i| {
            let start = i + 1 - period;
            let highest = high[start..=i].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lowest = low[start..=i].iter().cloned().fold(f64::INFINITY, f64::min);
            (highest, lowest)
        })
        .collect()
}

/// Williams %R.
///
/// Position of the close relative to the high-low range, from -100 to 0.
#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Calculate from OHLC data. A flat range yields the midpoint, -50.
    pub fn calculate_ohlc(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let len = high.len().min(low.len()).min(close.len());
        rolling_extremes(&high[..len], &low[..len], self.period)
            .into_iter()
            .enumerate()
            .map(|(j, (highest, lowest))| {
                let range = highest - lowest;
                if range == 0.0 {
                    -50.0
                } else {
                    (highest - close[j + self.period - 1]) / range * -100.0
                }
            })
            .collect()
    }
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self::new(14)
    }
}

impl Indicator for WilliamsR {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        self.calculate_ohlc(data, data, data)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "WilliamsR"
    }
}

/// Awesome Oscillator.
///
/// Difference between a fast and a slow SMA of the bar median price,
/// multiplied by `scale` (points to pips for FX quotes).
#[derive(Debug, Clone)]
pub struct AwesomeOscillator {
    fast_period: usize,
    slow_period: usize,
    scale: f64,
}

impl AwesomeOscillator {
    /// Create with default parameters (4, 64, scale 10000).
    pub fn new() -> Self {
        Self::with_periods(4, 64)
    }

    pub fn with_periods(fast: usize, slow: usize) -> Self {
        assert!(fast > 0 && slow > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            scale: 10_000.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Calculate from high/low data using the median price.
    pub fn calculate_hl(&self, high: &[f64], low: &[f64]) -> Vec<f64> {
        let median: Vec<f64> = high.iter().zip(low.iter()).map(|(h, l)| (h + l) / 2.0).collect();
        self.calculate(&median)
    }
}

impl Default for AwesomeOscillator {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for AwesomeOscillator {
    type Output = f64;

    /// Calculate over an already-computed median-price series.
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let fast = Sma::new(self.fast_period).calculate(data);
        let slow = Sma::new(self.slow_period).calculate(data);
        if slow.is_empty() {
            return vec![];
        }

        let offset = self.slow_period - self.fast_period;
        fast[offset..]
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| ((f - s) * self.scale * 100.0).round() / 100.0)
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period
    }

    fn name(&self) -> &str {
        "AwesomeOscillator"
    }
}
