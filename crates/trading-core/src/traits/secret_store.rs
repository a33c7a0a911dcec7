//! Secret store trait definition.

use crate::error::SecretError;
use crate::types::CustomerCredential;
use async_trait::async_trait;

/// Source of the customer credential set.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw secret string stored under `name`.
    async fn fetch(&self, name: &str) -> Result<String, SecretError>;

    /// Fetch and decode the credential set stored under `name`.
    async fn credentials(&self, name: &str) -> Result<Vec<CustomerCredential>, SecretError> {
        let raw = self.fetch(name).await?;
        CustomerCredential::decode_set(&raw).map_err(SecretError::Malformed)
    }
}
