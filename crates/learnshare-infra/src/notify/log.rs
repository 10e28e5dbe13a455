//! Code sender that writes to the log instead of sending mail.

use async_trait::async_trait;

use learnshare_core::ports::{CodeSender, NotifyError};

/// Development sender: emits the code as a tracing event.
///
/// Use only where logs are private; the code is written in clear text.
#[derive(Debug, Default)]
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(&self, recipient: &str, code: &str) -> Result<(), NotifyError> {
        if recipient.is_empty() {
            return Err(NotifyError::InvalidRecipient("empty recipient".to_string()));
        }
        tracing::info!(recipient = %recipient, code = %code, "Verification code (log delivery)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_empty_recipient() {
        let sender = LogCodeSender;
        assert!(sender.send_code("", "482913").await.is_err());
        assert!(sender.send_code("user@example.com", "482913").await.is_ok());
    }
}
