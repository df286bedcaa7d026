use async_trait::async_trait;

use crate::{domain::ChatId, Result};

/// Outbound messaging port.
///
/// Telegram is the only implementation; tests use in-memory recorders.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send one plain-text message to a conversation.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Show the "typing..." indicator. Best-effort; callers ignore failures.
    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        let _ = chat_id;
        Ok(())
    }
}

/// Webhook registration with the chat platform.
#[async_trait]
pub trait WebhookPort: Send + Sync {
    async fn set_webhook(&self, url: &str, drop_pending_updates: bool) -> Result<()>;
    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()>;
}
