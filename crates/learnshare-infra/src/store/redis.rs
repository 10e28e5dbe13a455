//! Redis TTL store with a managed connection and per-command deadlines.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, RedisResult};

use learnshare_core::ports::{StoreError, TtlStore, effective_ttl};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Upper bound for a single command round-trip
    pub command_timeout: Duration,
    /// Whether to fallback to the in-memory store if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_millis(500),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            command_timeout: std::env::var("REDIS_COMMAND_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_timeout),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.fallback_to_memory),
        }
    }
}

/// Redis-backed TTL store.
///
/// Uses connection manager for automatic reconnection. Every command is
/// bounded by `command_timeout`; a command that runs past it is reported as
/// [`StoreError::Timeout`], never as a missing key.
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisStore {
    pub async fn new(config: RedisConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis store");

        Ok(Self { conn, config })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisConfig::from_env()).await
    }

    async fn run<T>(
        &self,
        command: &'static str,
        key: &str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(command, key = %key, error = %e, "Redis command failed");
                Err(map_redis_error(e, self.config.command_timeout))
            }
            Err(_) => {
                tracing::warn!(command, key = %key, timeout = ?self.config.command_timeout, "Redis command timed out");
                Err(StoreError::Timeout(self.config.command_timeout))
            }
        }
    }

    /// `SET key value [NX] [PX ms]`. Returns whether the value was written.
    async fn set_with(
        &self,
        command: &'static str,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
        only_if_absent: bool,
    ) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if only_if_absent {
            cmd.arg("NX");
        }
        if let Some(ttl) = effective_ttl(ttl) {
            // PX needs at least 1ms
            cmd.arg("PX").arg((ttl.as_millis() as u64).max(1));
        }

        let mut conn = self.conn.clone();
        let reply: Option<String> = self.run(command, key, cmd.query_async(&mut conn)).await?;
        Ok(reply.is_some())
    }
}

fn map_redis_error(e: RedisError, timeout: Duration) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(timeout)
    } else if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.run("GET", key, conn.get::<_, Option<String>>(key))
            .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.set_with("SET", key, value, ttl, false).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.run("DEL", key, conn.del::<_, ()>(key)).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        self.run("EXISTS", key, conn.exists::<_, bool>(key)).await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        self.set_with("SET NX", key, value, ttl, true).await
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GETDEL");
        cmd.arg(key);
        self.run("GETDEL", key, cmd.query_async(&mut conn)).await
    }
}
