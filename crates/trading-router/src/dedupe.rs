//! In-process ledger of dispatched idempotency keys.

use std::collections::HashSet;
use tokio::sync::Mutex;

/// Keys of orders this process has already dispatched.
///
/// Scoped to one process; redeliveries landing on another instance rely on
/// the broker-side client reference instead.
#[derive(Debug, Default)]
pub struct DedupeLedger {
    keys: Mutex<HashSet<String>>,
}

impl DedupeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns false when it was already claimed.
    pub async fn claim(&self, key: &str) -> bool {
        self.keys.lock().await.insert(key.to_string())
    }

    /// Forget `key` so a redelivery dispatches again.
    pub async fn release(&self, key: &str) {
        self.keys.lock().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.keys.lock().await.len()
    }
}
