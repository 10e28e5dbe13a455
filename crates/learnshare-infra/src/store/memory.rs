//! In-memory TTL store - used as fallback when Redis is unavailable, and as
//! the fake store in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use learnshare_core::ports::{StoreError, TtlStore, effective_ttl};

struct StoreEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: effective_ttl(ttl).map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// In-memory store using a HashMap behind an async RwLock.
///
/// Expiry uses `tokio::time::Instant`, so a paused test runtime can move the
/// clock forward with `tokio::time::advance`. Expired entries are dropped
/// lazily on access; call [`InMemoryStore::purge_expired`] periodically to
/// reclaim keys nobody reads again.
/// Note: Data is lost on process restart and is not shared between instances.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoreEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Remove every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtlStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        if !entry.is_expired(now) {
            return Ok(Some(entry.value.clone()));
        }

        drop(entries);
        // Re-check under the write lock; a concurrent set may have replaced it.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoreEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_expired(now)) {
            return Ok(false);
        }
        entries.insert(key.to_string(), StoreEntry::new(value, ttl));
        Ok(true)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Ok(entries
            .remove(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value))
    }
}
