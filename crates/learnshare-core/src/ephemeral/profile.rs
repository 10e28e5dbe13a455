//! Read-through cache of user records.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::namespaced;
use crate::domain::UserProfile;
use crate::error::CacheError;
use crate::ports::TtlStore;

/// Whole-record cache of [`UserProfile`]s keyed by user id.
///
/// Only the credential-free profile view is stored; password hashes never
/// reach the shared store.
///
/// Misses are `Ok(None)` so callers fall back to the user repository. Entries
/// are only ever replaced by another `put` or dropped by expiry; keeping them
/// fresh after a write is up to whoever owns that write.
#[derive(Clone)]
pub struct ProfileCache {
    store: Arc<dyn TtlStore>,
    prefix: String,
}

impl ProfileCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
    pub const DEFAULT_PREFIX: &'static str = "user:";

    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self {
            store,
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, user_id: Uuid) -> String {
        namespaced(&self.prefix, &user_id.to_string())
    }

    pub async fn put(
        &self,
        user_id: Uuid,
        record: &UserProfile,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidInput(
                "profile cache entries require a non-zero TTL".to_string(),
            ));
        }

        let json =
            serde_json::to_string(record).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store.set(&self.key(user_id), &json, Some(ttl)).await?;

        tracing::debug!(user_id = %user_id, ttl_secs = ttl.as_secs(), "Profile cached");
        Ok(())
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<UserProfile>, CacheError> {
        let key = self.key(user_id);
        let Some(json) = self.store.get(&key).await? else {
            tracing::debug!(user_id = %user_id, "Profile cache miss");
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| CacheError::Corrupted {
                key,
                reason: e.to_string(),
            })
    }
}
