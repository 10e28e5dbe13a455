//! Outbound notification port.

use async_trait::async_trait;

/// Delivers verification codes to recipients (mail, SMS, ...).
///
/// The caches only store and check codes; delivery is always done by the
/// workflow through this port.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(&self, recipient: &str, code: &str) -> Result<(), NotifyError>;
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}
