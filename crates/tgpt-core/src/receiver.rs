//! Webhook receiver: registration lifecycle plus per-request handling.
//!
//! HTTP framing lives in the Telegram adapter; this type only knows raw
//! bodies and the ports it was built with.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    dispatch::{DispatchOutcome, Dispatcher},
    messaging::port::WebhookPort,
    update::{parse_update, ParsedUpdate},
    utils::body_preview,
    Result,
};

const MALFORMED_PREVIEW_LEN: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookState {
    Unregistered,
    Registered,
}

/// What `handle_request` did with a well-formed body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Update kind the bot does not answer; acknowledged without dispatch.
    Ignored,
    Dispatched(DispatchOutcome),
}

pub struct Receiver {
    webhook: Arc<dyn WebhookPort>,
    dispatcher: Arc<Dispatcher>,
    drop_pending_updates: bool,
    state: RwLock<WebhookState>,
}

impl Receiver {
    pub fn new(
        webhook: Arc<dyn WebhookPort>,
        dispatcher: Arc<Dispatcher>,
        drop_pending_updates: bool,
    ) -> Self {
        Self {
            webhook,
            dispatcher,
            drop_pending_updates,
            state: RwLock::new(WebhookState::Unregistered),
        }
    }

    pub async fn state(&self) -> WebhookState {
        *self.state.read().await
    }

    /// Point the platform at `callback_url`.
    ///
    /// Clears any previous webhook first (dropping updates queued while the
    /// process was down, if configured), then sets the new one. Safe to call
    /// on every start.
    pub async fn register_webhook(&self, callback_url: &str) -> Result<()> {
        let mut state = self.state.write().await;

        self.webhook
            .delete_webhook(self.drop_pending_updates)
            .await?;
        self.webhook
            .set_webhook(callback_url, self.drop_pending_updates)
            .await?;

        *state = WebhookState::Registered;
        tracing::info!(
            drop_pending_updates = self.drop_pending_updates,
            "webhook registered"
        );
        Ok(())
    }

    /// Remove the webhook on shutdown. Best-effort: failures are logged.
    pub async fn deregister_webhook(&self) {
        let mut state = self.state.write().await;
        match self.webhook.delete_webhook(false).await {
            Ok(()) => tracing::info!("webhook deregistered"),
            Err(e) => tracing::warn!(error = %e, "webhook deregistration failed"),
        }
        *state = WebhookState::Unregistered;
    }

    /// Parse one webhook body and dispatch it to completion.
    ///
    /// Only [`crate::Error::MalformedUpdate`] escapes; the dispatcher absorbs every
    /// other failure.
    pub async fn handle_request(&self, body: &[u8]) -> Result<HandleOutcome> {
        let parsed = match parse_update(body) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    payload = %body_preview(body, MALFORMED_PREVIEW_LEN),
                    "rejecting malformed update"
                );
                return Err(e);
            }
        };

        match parsed {
            ParsedUpdate::Ignored(update_id) => {
                tracing::debug!(update_id = update_id.0, "ignoring non-message update");
                Ok(HandleOutcome::Ignored)
            }
            ParsedUpdate::Message(update) => Ok(HandleOutcome::Dispatched(
                self.dispatcher.dispatch(&update).await,
            )),
        }
    }
}
