//! Fixed-window cool-down per source.

use std::sync::Arc;
use std::time::Duration;

use super::namespaced;
use crate::error::CacheError;
use crate::ports::TtlStore;

const MARK_VALUE: &str = "1";

/// One action per source per window.
///
/// A source is limited while its mark exists; the moment the mark expires the
/// source has its full allowance back. The expected call order is
/// `is_limited`, then the action, then `mark`. That sequence can race between
/// concurrent requests from the same source; use [`Self::try_acquire`] when
/// it must not.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    prefix: String,
    window: Duration,
}

impl RateLimiter {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
    pub const DEFAULT_PREFIX: &'static str = "email_rate_limit:";

    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self {
            store,
            prefix: Self::DEFAULT_PREFIX.to_string(),
            window: Self::DEFAULT_WINDOW,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start a new window for `source`, regardless of any existing mark.
    pub async fn mark(&self, source: &str) -> Result<(), CacheError> {
        self.store
            .set(&namespaced(&self.prefix, source), MARK_VALUE, Some(self.window))
            .await?;
        Ok(())
    }

    pub async fn is_limited(&self, source: &str) -> Result<bool, CacheError> {
        Ok(self.store.exists(&namespaced(&self.prefix, source)).await?)
    }

    /// Check and mark in one atomic step. `Ok(true)` means the caller may
    /// proceed and the window has started.
    pub async fn try_acquire(&self, source: &str) -> Result<bool, CacheError> {
        let acquired = self
            .store
            .set_if_absent(&namespaced(&self.prefix, source), MARK_VALUE, Some(self.window))
            .await?;
        if !acquired {
            tracing::debug!(source = %source, "Rate limit window still open");
        }
        Ok(acquired)
    }
}
