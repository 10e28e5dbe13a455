//! Ephemeral caches built on the [`TtlStore`] port.
//!
//! All state kept here is short-lived and expires on its own through the
//! store's TTL. The caches hold no in-process state and never lock: each one
//! is a thin facade that namespaces its keys and encodes its values, so any
//! number of request handlers can share them.
//!
//! ## Caches
//!
//! - **verification** - one-time codes per recipient (10 min TTL)
//! - **revocation** - revoked bearer tokens (72 h TTL)
//! - **rate_limit** - fixed cool-down marks per source (1 min window)
//! - **profile** - read-through copies of user records (caller TTL)
//!
//! ## Key Patterns (default prefixes)
//!
//! ```text
//! verify_code:{email}        → "<code>_<unix_seconds>"
//! revoked_token:{token}      → "blacklisted"
//! email_rate_limit:{ip}      → "1"
//! user:{user_id}             → UserProfile JSON (no password hash)
//! ```
//!
//! Setting a prefix to the empty string reproduces the legacy bare-key
//! layout for codes and tokens.

mod profile;
mod rate_limit;
mod revocation;
mod verification;

pub use profile::ProfileCache;
pub use rate_limit::RateLimiter;
pub use revocation::{REVOKED_SENTINEL, RevocationRegistry};
pub use verification::{CODE_DELIMITER, VerificationCode, VerificationCodeStore, generate_code};

use std::sync::Arc;
use std::time::Duration;

use crate::ports::TtlStore;

/// Tunables for the ephemeral caches.
#[derive(Debug, Clone)]
pub struct EphemeralConfig {
    /// How long an issued verification code stays valid.
    pub code_ttl: Duration,
    /// How long a revocation mark lives. Must cover the longest token lifetime.
    pub revocation_ttl: Duration,
    /// Fixed cool-down window for rate-limited actions.
    pub rate_limit_window: Duration,
    /// TTL the workflows use when populating the profile cache.
    pub profile_ttl: Duration,
    pub code_prefix: String,
    pub revocation_prefix: String,
    pub rate_limit_prefix: String,
    pub profile_prefix: String,
}

impl Default for EphemeralConfig {
    fn default() -> Self {
        Self {
            code_ttl: VerificationCodeStore::DEFAULT_TTL,
            revocation_ttl: RevocationRegistry::DEFAULT_TTL,
            rate_limit_window: RateLimiter::DEFAULT_WINDOW,
            profile_ttl: ProfileCache::DEFAULT_TTL,
            code_prefix: VerificationCodeStore::DEFAULT_PREFIX.to_string(),
            revocation_prefix: RevocationRegistry::DEFAULT_PREFIX.to_string(),
            rate_limit_prefix: RateLimiter::DEFAULT_PREFIX.to_string(),
            profile_prefix: ProfileCache::DEFAULT_PREFIX.to_string(),
        }
    }
}

/// All ephemeral caches, sharing one store handle.
#[derive(Clone)]
pub struct EphemeralStores {
    pub codes: VerificationCodeStore,
    pub revocations: RevocationRegistry,
    pub rate_limiter: RateLimiter,
    pub profiles: ProfileCache,
    /// TTL to pass to [`ProfileCache::put`].
    pub profile_ttl: Duration,
}

impl EphemeralStores {
    pub fn new(store: Arc<dyn TtlStore>, config: &EphemeralConfig) -> Self {
        Self {
            codes: VerificationCodeStore::new(store.clone())
                .with_prefix(config.code_prefix.clone())
                .with_ttl(config.code_ttl),
            revocations: RevocationRegistry::new(store.clone())
                .with_prefix(config.revocation_prefix.clone())
                .with_ttl(config.revocation_ttl),
            rate_limiter: RateLimiter::new(store.clone())
                .with_prefix(config.rate_limit_prefix.clone())
                .with_window(config.rate_limit_window),
            profiles: ProfileCache::new(store).with_prefix(config.profile_prefix.clone()),
            profile_ttl: config.profile_ttl,
        }
    }
}

fn namespaced(prefix: &str, id: &str) -> String {
    format!("{prefix}{id}")
}
