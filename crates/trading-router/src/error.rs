//! Router errors.

use thiserror::Error;
use trading_core::error::{PublishError, SecretError};

/// Failures of a whole routing invocation.
///
/// Broker failures never appear here; they become failed responses.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("Credential lookup failed: {0}")]
    Credentials(#[from] SecretError),

    /// Some outcomes could not be published
    #[error("{failed} of {total} publications failed: {first}")]
    PublishFailed {
        failed: usize,
        total: usize,
        first: PublishError,
    },
}

impl RouterError {
    /// Whether redelivering the trigger may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RouterError::InvalidTrigger(_) => false,
            RouterError::Credentials(e) => e.is_transient(),
            RouterError::PublishFailed { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transience() {
        assert!(RouterError::Credentials(SecretError::Unavailable("timeout".into())).is_transient());
        assert!(!RouterError::Credentials(SecretError::Malformed("bad".into())).is_transient());
        assert!(!RouterError::InvalidTrigger("empty".into()).is_transient());
        assert!(RouterError::PublishFailed {
            failed: 1,
            total: 2,
            first: PublishError::Unavailable("down".into()),
        }
        .is_transient());
    }
}
