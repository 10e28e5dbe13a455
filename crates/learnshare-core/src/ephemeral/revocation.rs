//! Revoked bearer tokens.

use std::sync::Arc;
use std::time::Duration;

use super::namespaced;
use crate::error::CacheError;
use crate::ports::TtlStore;

/// Value written for a revoked token. Anything else under the same key is
/// treated as "not revoked".
pub const REVOKED_SENTINEL: &str = "blacklisted";

/// Marks tokens as revoked until they could no longer be valid anyway.
///
/// Marks are never deleted; they expire after the registry TTL, which has to
/// be at least the lifetime of any issued token (see [`Self::covers`]).
#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn TtlStore>,
    prefix: String,
    ttl: Duration,
}

impl RevocationRegistry {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(72 * 60 * 60);
    pub const DEFAULT_PREFIX: &'static str = "revoked_token:";

    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self {
            store,
            prefix: Self::DEFAULT_PREFIX.to_string(),
            ttl: Self::DEFAULT_TTL,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether marks live at least as long as a token issued with
    /// `max_token_lifetime`.
    pub fn covers(&self, max_token_lifetime: Duration) -> bool {
        self.ttl >= max_token_lifetime
    }

    /// Revoke `token`. Revoking twice only refreshes the mark's TTL.
    pub async fn revoke(&self, token: &str) -> Result<(), CacheError> {
        self.store
            .set(&namespaced(&self.prefix, token), REVOKED_SENTINEL, Some(self.ttl))
            .await?;
        tracing::debug!(ttl_secs = self.ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// `Ok(false)` for tokens never revoked. Store failures are returned as
    /// errors; authentication must deny on them.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, CacheError> {
        let key = namespaced(&self.prefix, token);
        match self.store.get(&key).await? {
            Some(value) if value == REVOKED_SENTINEL => Ok(true),
            Some(_) => {
                tracing::warn!("Foreign value found under revocation key, ignoring");
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
