use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rejected by channel: {0}")]
    Rejected(String),
}

/// A destination that accepts a plain-text message.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Logs the message instead of delivering it. Used when no chat credentials are configured.
pub struct LogNotifier;

#[async_trait]
impl NotificationChannel for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        info!("📨 Notification would be sent (no chat configured):\n{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
