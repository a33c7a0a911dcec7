//! Credential sources.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use trading_core::error::SecretError;
use trading_core::traits::SecretStore;

/// Secrets held in memory.
#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<HashMap<String, String>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().await.insert(name.into(), value.into());
    }

    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        if *self.unavailable.read().await {
            return Err(SecretError::Unavailable("store offline".to_string()));
        }
        self.secrets
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

/// Secrets read from disk.
///
/// When the path is a directory, secret `name` is read from `<dir>/<name>.json`;
/// otherwise the file itself is the secret for any name.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let path = if self.path.is_dir() {
            self.path.join(format!("{}.json", name))
        } else {
            self.path.clone()
        };
        debug!(path = %path.display(), "Reading secret file");

        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SecretError::NotFound(path.display().to_string()),
            _ => SecretError::Unavailable(e.to_string()),
        })
    }
}

/// Secret read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    var: String,
}

impl EnvSecretStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, _name: &str) -> Result<String, SecretError> {
        std::env::var(&self.var).map_err(|_| SecretError::NotFound(self.var.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CREDENTIALS: &str = r#"[{"accountName":"IG_ROBOTICFUND","broker":"IG","identifier":"id","password":"pw","apiKey":"k","positionSize":{"defaultSize":1}}]"#;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySecretStore::new();
        store.insert("customer-broker-credentials", CREDENTIALS).await;

        let credentials = store.credentials("customer-broker-credentials").await.unwrap();
        assert_eq!(credentials.len(), 1);
        assert!(matches!(store.fetch("other").await, Err(SecretError::NotFound(_))));

        store.set_unavailable(true).await;
        assert!(store.fetch("customer-broker-credentials").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let store = InMemorySecretStore::new();
        store.insert("creds", "{not json").await;
        assert!(matches!(store.credentials("creds").await, Err(SecretError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_file_store_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("customer-broker-credentials.json"), CREDENTIALS).unwrap();

        let store = FileSecretStore::new(dir.path());
        assert_eq!(store.credentials("customer-broker-credentials").await.unwrap().len(), 1);
        assert!(matches!(store.fetch("missing").await, Err(SecretError::NotFound(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CREDENTIALS.as_bytes()).unwrap();
        let store = FileSecretStore::new(file.path());
        assert_eq!(store.credentials("anything").await.unwrap().len(), 1);
    }
}
