//! Error types for the trading pipeline.

use thiserror::Error;

/// Top-level pipeline error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Secret store error: {0}")]
    Secret(#[from] SecretError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broker-specific errors.
///
/// These never cross a [`BrokerAdapter`](crate::traits::BrokerAdapter)
/// boundary; they are normalized into a failed
/// [`BrokerResponse`](crate::types::BrokerResponse) first.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Market not found: {0}")]
    MarketNotFound(String),

    #[error("Unsupported broker: {0}")]
    UnsupportedBroker(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl BrokerError {
    /// Stable machine-readable kind, used in the response error detail.
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::Configuration(_) => "configuration",
            BrokerError::Connection(_) => "connection",
            BrokerError::AuthenticationError(_) => "authentication",
            BrokerError::OrderRejected(_) => "rejected",
            BrokerError::RateLimited { .. } => "rate_limited",
            BrokerError::MarketNotFound(_) => "market_not_found",
            BrokerError::UnsupportedBroker(_) => "unsupported_broker",
            BrokerError::InvalidOrder(_) => "invalid_order",
            BrokerError::Timeout(_) => "timeout",
            BrokerError::NetworkError(_) => "network",
            BrokerError::ApiError(_) => "api",
        }
    }

    /// Whether resubmitting the same order later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrokerError::Connection(_)
                | BrokerError::RateLimited { .. }
                | BrokerError::Timeout(_)
                | BrokerError::NetworkError(_)
        )
    }
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Credential source errors.
#[derive(Error, Debug)]
pub enum SecretError {
    /// The store could not be reached; the invocation may be retried.
    #[error("Secret store unavailable: {0}")]
    Unavailable(String),

    #[error("Secret not found: {0}")]
    NotFound(String),

    /// The secret exists but does not decode into credentials.
    #[error("Malformed secret payload: {0}")]
    Malformed(String),
}

impl SecretError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SecretError::Unavailable(_))
    }
}

/// Event bus publication errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("Topic not configured: {0}")]
    UnknownTopic(String),

    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    #[error("Publish rejected by bus: {0}")]
    Rejected(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Inbound payload decoding errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid {topic} payload: {reason}")]
    InvalidPayload { topic: String, reason: String },

    #[error("Payload failed validation: {0}")]
    Validation(String),
}

/// Result type alias for pipeline operations.
pub type TradingResult<T> = Result<T, TradingError>;
