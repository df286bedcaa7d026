//! Telegram adapter (teloxide) plus the webhook HTTP server (axum).
//!
//! `TelegramMessenger` implements the core messaging and webhook ports over
//! the Bot API; `server` owns the routing table and serve loop.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ChatAction};

use tokio::time::sleep;

pub mod server;

use tgpt_core::{domain::ChatId, errors::Error, messaging::port::*, Result};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    /// Run `op`, honouring one Telegram flood-control `RetryAfter`.
    async fn with_retry<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, teloxide::RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after = ?d, "telegram flood control; waiting");
                    sleep(d).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await
            .map_err(|e| Error::Delivery(format!("telegram sendMessage: {e}")))?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId) -> Result<()> {
        self.bot
            .send_chat_action(Self::tg_chat(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| Error::External(format!("telegram sendChatAction: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl WebhookPort for TelegramMessenger {
    async fn set_webhook(&self, url: &str, drop_pending_updates: bool) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid webhook url: {e}")))?;
        self.with_retry(|| {
            self.bot
                .set_webhook(url.clone())
                .drop_pending_updates(drop_pending_updates)
        })
        .await
        .map_err(|e| Error::External(format!("telegram setWebhook: {e}")))?;
        Ok(())
    }

    async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_webhook()
                .drop_pending_updates(drop_pending_updates)
        })
        .await
        .map_err(|e| Error::External(format!("telegram deleteWebhook: {e}")))?;
        Ok(())
    }
}
