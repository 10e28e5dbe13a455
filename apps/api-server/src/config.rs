//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use learnshare_core::ephemeral::EphemeralConfig;
use learnshare_infra::{JwtConfig, RedisConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub ephemeral: EphemeralConfig,
    /// How often the in-memory fallback store drops expired entries.
    pub sweep_interval: Duration,
    /// Take the client address from `Forwarded` / `X-Forwarded-For`. Only
    /// safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            redis: RedisConfig::from_env(),
            jwt: JwtConfig::from_env(),
            ephemeral: Self::ephemeral_from_env(),
            sweep_interval: Duration::from_secs(env_or("MEMORY_STORE_SWEEP_SECS", 60)),
            trust_proxy_headers: env_or("TRUST_PROXY_HEADERS", false),
        }
    }

    /// TTLs for the ephemeral caches. Key prefixes keep their defaults.
    fn ephemeral_from_env() -> EphemeralConfig {
        let defaults = EphemeralConfig::default();
        EphemeralConfig {
            code_ttl: Duration::from_secs(env_or(
                "CODE_TTL_SECS",
                defaults.code_ttl.as_secs(),
            )),
            revocation_ttl: hours(env_or(
                "TOKEN_REVOCATION_TTL_HOURS",
                defaults.revocation_ttl.as_secs() / 3600,
            )),
            rate_limit_window: Duration::from_secs(env_or(
                "EMAIL_RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )),
            profile_ttl: Duration::from_secs(env_or(
                "PROFILE_CACHE_TTL_SECS",
                defaults.profile_ttl.as_secs(),
            )),
            ..defaults
        }
    }
}

/// Saturates rather than wrapping, so an absurd setting stays absurdly long.
fn hours(h: u64) -> Duration {
    Duration::from_secs(h.saturating_mul(3600))
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
