//! Technical indicators for the metrics service.
//!
//! This crate provides the indicator arithmetic behind each metric snapshot:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD, Stochastic, Williams %R, Awesome Oscillator)
//! - Windowed aggregates (cumulative sums, counts above a threshold)
//!
//! Every indicator returns an empty series when given fewer points than its
//! period; nothing is zero-filled.

pub mod aggregates;
pub mod momentum;
pub mod moving_average;

pub use momentum::{
    AwesomeOscillator, Macd, MacdOutput, Rsi, Stochastic, StochasticOutput, WilliamsR,
};
pub use moving_average::{Ema, Sma};
