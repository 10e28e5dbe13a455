//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use learnshare_core::ephemeral::EphemeralStores;
use learnshare_core::ports::{StoreError, TokenService, TtlStore};
use learnshare_infra::{
    Argon2PasswordService, InMemoryStore, InMemoryUserRepository, JwtTokenService, LogCodeSender,
    RedisStore,
};

use crate::config::AppConfig;
use crate::services::AccountService;

/// Reasons the server refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Redis unavailable and memory fallback disabled: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error(
        "Revocation TTL {revocation_ttl:?} is shorter than the token lifetime {token_lifetime:?}; \
         revoked tokens would become valid again"
    )]
    RevocationTooShort {
        revocation_ttl: Duration,
        token_lifetime: Duration,
    },
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TtlStore>,
    pub accounts: Arc<AccountService>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let store = Self::connect_store(config).await?;
        Self::from_store(store, config)
    }

    /// Wire the services over an already connected store.
    pub fn from_store(store: Arc<dyn TtlStore>, config: &AppConfig) -> Result<Self, StartupError> {
        let caches = EphemeralStores::new(store.clone(), &config.ephemeral);

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        if !caches.revocations.covers(tokens.token_lifetime()) {
            return Err(StartupError::RevocationTooShort {
                revocation_ttl: caches.revocations.ttl(),
                token_lifetime: tokens.token_lifetime(),
            });
        }

        let accounts = AccountService::new(
            Arc::new(InMemoryUserRepository::new()),
            caches,
            tokens,
            Arc::new(Argon2PasswordService::new()),
            Arc::new(LogCodeSender),
        );

        tracing::info!("Application state initialized");

        Ok(Self {
            store,
            accounts: Arc::new(accounts),
            trust_proxy_headers: config.trust_proxy_headers,
        })
    }

    async fn connect_store(config: &AppConfig) -> Result<Arc<dyn TtlStore>, StartupError> {
        match RedisStore::new(config.redis.clone()).await {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) if config.redis.fallback_to_memory => {
                tracing::warn!(
                    error = %e,
                    "Failed to connect to Redis. Using in-memory store; entries are lost on restart."
                );
                let store = Arc::new(InMemoryStore::new());
                spawn_sweeper(store.clone(), config.sweep_interval);
                Ok(store)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Periodically drop expired entries so the in-memory store stays bounded.
fn spawn_sweeper(store: Arc<InMemoryStore>, interval: Duration) {
    if interval.is_zero() {
        return;
    }

    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Swept expired entries from memory store");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use learnshare_core::ephemeral::EphemeralConfig;
    use learnshare_infra::{JwtConfig, RedisConfig};

    fn config(revocation_ttl: Duration, token_hours: i64) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            redis: RedisConfig::default(),
            jwt: JwtConfig {
                expiration_hours: token_hours,
                ..JwtConfig::default()
            },
            ephemeral: EphemeralConfig {
                revocation_ttl,
                ..EphemeralConfig::default()
            },
            sweep_interval: Duration::from_secs(60),
            trust_proxy_headers: false,
        }
    }

    #[test]
    fn test_rejects_revocation_ttl_shorter_than_tokens() {
        let result = AppState::from_store(
            Arc::new(InMemoryStore::new()),
            &config(Duration::from_secs(3600), 24),
        );
        assert!(matches!(result, Err(StartupError::RevocationTooShort { .. })));
    }

    #[test]
    fn test_default_ttls_are_consistent() {
        let result = AppState::from_store(
            Arc::new(InMemoryStore::new()),
            &config(Duration::from_secs(72 * 3600), 24),
        );
        assert!(result.is_ok());
    }
}
