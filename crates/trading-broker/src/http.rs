//! Shared HTTP error mapping for broker clients.

use reqwest::{Response, StatusCode};
use trading_core::error::BrokerError;

pub(crate) const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Map a transport-level failure.
pub(crate) fn transport_error(e: reqwest::Error, timeout_secs: u64) -> BrokerError {
    if e.is_timeout() {
        BrokerError::Timeout(timeout_secs)
    } else if e.is_connect() {
        BrokerError::Connection(e.to_string())
    } else {
        BrokerError::NetworkError(e.to_string())
    }
}

/// Turn a non-success response into a [`BrokerError`].
pub(crate) async fn status_error(resp: Response) -> BrokerError {
    let status = resp.status();
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let text = resp.text().await.unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BrokerError::AuthenticationError(format!("{}: {}", status, text))
        }
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(60),
        },
        s if s.is_server_error() => BrokerError::Connection(format!("{}: {}", status, text)),
        _ => BrokerError::ApiError(format!("{}: {}", status, text)),
    }
}
