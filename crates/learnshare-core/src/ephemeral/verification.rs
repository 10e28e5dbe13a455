//! One-time verification codes keyed by recipient.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use super::namespaced;
use crate::error::CacheError;
use crate::ports::TtlStore;

/// Separator between the code and its issuance timestamp in the stored value.
pub const CODE_DELIMITER: char = '_';

/// A pending code together with the moment it was issued.
///
/// Stored as `"<code>_<unix_seconds>"`. Expiry is left to the store TTL;
/// `issued_at` is kept so a time-window check can be added without changing
/// what is on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub issued_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.code,
            CODE_DELIMITER,
            self.issued_at.timestamp()
        )
    }

    /// Parse a stored value. Anything that is not exactly `code` + delimiter +
    /// integer timestamp is rejected.
    pub fn decode(raw: &str) -> Result<Self, String> {
        let fields: Vec<&str> = raw.split(CODE_DELIMITER).collect();
        let [code, timestamp] = fields.as_slice() else {
            return Err(format!("expected 2 fields, found {}", fields.len()));
        };
        if code.is_empty() {
            return Err("empty code".to_string());
        }
        let secs: i64 = timestamp
            .parse()
            .map_err(|_| format!("invalid issuance timestamp {timestamp:?}"))?;
        let issued_at = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| format!("issuance timestamp {secs} out of range"))?;

        Ok(Self {
            code: code.to_string(),
            issued_at,
        })
    }
}

/// Generate a six-digit numeric code.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Issues, reads back and invalidates verification codes.
///
/// Last issued wins: issuing again for the same recipient replaces the
/// pending code. The store does not count uses; callers invalidate after a
/// successful check.
#[derive(Clone)]
pub struct VerificationCodeStore {
    store: Arc<dyn TtlStore>,
    prefix: String,
    ttl: Duration,
}

impl VerificationCodeStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
    pub const DEFAULT_PREFIX: &'static str = "verify_code:";

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

    fn key(&self, recipient: &str) -> String {
        namespaced(&self.prefix, recipient)
    }

    /// Store `code` for `recipient`, replacing any pending one.
    pub async fn issue(&self, recipient: &str, code: &str) -> Result<(), CacheError> {
        if code.is_empty() || code.contains(CODE_DELIMITER) {
            return Err(CacheError::InvalidInput(format!(
                "verification code must be non-empty and must not contain {CODE_DELIMITER:?}"
            )));
        }

        let value = VerificationCode::new(code).encode();
        self.store
            .set(&self.key(recipient), &value, Some(self.ttl))
            .await?;

        tracing::debug!(recipient = %recipient, ttl_secs = self.ttl.as_secs(), "Verification code issued");
        Ok(())
    }

    /// The pending code for `recipient`.
    pub async fn lookup(&self, recipient: &str) -> Result<String, CacheError> {
        self.lookup_entry(recipient).await.map(|entry| entry.code)
    }

    /// The pending code for `recipient` with its issuance time.
    pub async fn lookup_entry(&self, recipient: &str) -> Result<VerificationCode, CacheError> {
        let key = self.key(recipient);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| CacheError::NotFound { key: key.clone() })?;

        VerificationCode::decode(&raw).map_err(|reason| {
            tracing::warn!(key = %key, reason = %reason, "Malformed verification code entry");
            CacheError::Format { key, reason }
        })
    }

    /// Check `candidate` against the pending code. Does not invalidate.
    pub async fn verify(&self, recipient: &str, candidate: &str) -> Result<(), CacheError> {
        let stored = self.lookup(recipient).await?;
        if constant_time_eq(stored.as_bytes(), candidate.as_bytes()) {
            Ok(())
        } else {
            Err(CacheError::Mismatch)
        }
    }

    /// Drop the pending code for `recipient`, if any.
    pub async fn invalidate(&self, recipient: &str) -> Result<(), CacheError> {
        self.store.delete(&self.key(recipient)).await?;
        tracing::debug!(recipient = %recipient, "Verification code invalidated");
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
