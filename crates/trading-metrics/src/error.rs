//! Metrics computation errors.

use thiserror::Error;
use trading_core::error::{DataError, PublishError};
use trading_core::Resolution;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Not enough bars to compute every field of every snapshot
    #[error("Insufficient history for {resolution}: need {required} bars, have {available}")]
    InsufficientHistory {
        resolution: Resolution,
        required: usize,
        available: usize,
    },

    #[error("Invalid metrics configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to serialize input event: {0}")]
    Serialization(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Failure handling one market-data event in the metrics service.
#[derive(Error, Debug)]
pub enum MetricsServiceError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("Failed to load history: {0}")]
    History(#[from] DataError),
}
