//! TTL key/value store port.

use std::time::Duration;

use async_trait::async_trait;

/// Key/value store with per-entry expiry - abstraction over Redis and the
/// in-memory fallback.
///
/// Every operation is atomic on its own key. Nothing is atomic across two
/// calls, so `get` followed by `delete` may interleave with other callers;
/// use `take` or `set_if_absent` where that matters.
///
/// A `ttl` of `None` or zero means the entry never expires.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key does not exist (or has expired).
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one and its expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key currently exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Write only if the key is absent. Returns `true` when the value was written.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    /// Read and remove a value in one step.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Store operation errors.
///
/// A missing key is never one of these; it is reported as `Ok(None)` or
/// `Ok(false)` by the operations above.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Normalise a caller TTL: zero means "no expiry", same as `None`.
pub fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        assert_eq!(effective_ttl(Some(Duration::ZERO)), None);
        assert_eq!(effective_ttl(None), None);
        assert_eq!(
            effective_ttl(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
    }
}
