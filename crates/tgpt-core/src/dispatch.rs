//! Reply dispatcher: one inbound update in, one or more chat messages out.
//!
//! Every dispatch sends at least one message to the originating chat and
//! never to any other. Failures stop here; callers only see a
//! [`DispatchOutcome`].

use std::sync::Arc;

use crate::{
    chunking::split_into_chunks,
    completion::{CompletionClient, CompletionError, ModelParams},
    config::Config,
    domain::ChatId,
    messaging::port::MessagingPort,
    retry::{retry, RetryPolicy},
    update::InboundUpdate,
};

#[derive(Clone, Debug)]
pub struct DispatchSettings {
    pub params: ModelParams,
    pub retry: RetryPolicy,
    pub chunk_limit: usize,
    pub empty_text_notice: String,
    pub error_notice: String,
}

impl DispatchSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            params: cfg.model_params(),
            retry: cfg.retry_policy(),
            chunk_limit: cfg.chunk_limit,
            empty_text_notice: cfg.empty_text_notice.clone(),
            error_notice: cfg.error_notice.clone(),
        }
    }
}

/// What a dispatch ended up sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No usable text; the prompt-for-input notice was sent instead.
    PromptedForInput,
    /// The completion succeeded and was sent as `chunks` messages, of which
    /// `failed` could not be delivered.
    Replied { chunks: usize, failed: usize },
    /// The completion failed terminally; one apology was sent.
    Apologized { cause: CompletionError },
}

pub struct Dispatcher {
    completion: Arc<dyn CompletionClient>,
    messenger: Arc<dyn MessagingPort>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        messenger: Arc<dyn MessagingPort>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            completion,
            messenger,
            settings,
        }
    }

    pub async fn dispatch(&self, update: &InboundUpdate) -> DispatchOutcome {
        let chat_id = update.chat_id;

        let Some(prompt) = update.prompt_text() else {
            tracing::info!(
                update_id = update.update_id.0,
                chat_id = chat_id.0,
                sender = %update.sender,
                "empty message; asking for input"
            );
            self.send_notice(chat_id, &self.settings.empty_text_notice)
                .await;
            return DispatchOutcome::PromptedForInput;
        };

        tracing::info!(
            update_id = update.update_id.0,
            chat_id = chat_id.0,
            sender = %update.sender,
            prompt_chars = prompt.chars().count(),
            "dispatching prompt"
        );

        if let Err(e) = self.messenger.send_typing(chat_id).await {
            tracing::debug!(chat_id = chat_id.0, error = %e, "typing indicator failed");
        }

        let req = self.settings.params.request(prompt);
        let result = retry(
            self.settings.retry,
            CompletionError::is_transient,
            |attempt| {
                tracing::debug!(chat_id = chat_id.0, attempt, "completion attempt");
                self.completion.complete(&req)
            },
        )
        .await
        .and_then(|text| {
            if text.is_empty() {
                Err(CompletionError::MalformedResponse(
                    "empty completion text".to_string(),
                ))
            } else {
                Ok(text)
            }
        });

        let text = match result {
            Ok(text) => text,
            Err(cause) => {
                tracing::error!(
                    update_id = update.update_id.0,
                    chat_id = chat_id.0,
                    error = %cause,
                    "completion failed; sending apology"
                );
                self.send_notice(chat_id, &self.settings.error_notice).await;
                return DispatchOutcome::Apologized { cause };
            }
        };

        let chunks = split_into_chunks(&text, self.settings.chunk_limit);
        let total = chunks.len();
        let mut failed = 0usize;
        for (idx, chunk) in chunks.iter().enumerate() {
            if let Err(e) = self.messenger.send_text(chat_id, chunk).await {
                failed += 1;
                tracing::warn!(
                    chat_id = chat_id.0,
                    chunk = idx + 1,
                    total,
                    error = %e,
                    "chunk delivery failed; continuing"
                );
            }
        }

        tracing::info!(
            update_id = update.update_id.0,
            chat_id = chat_id.0,
            chunks = total,
            failed,
            "reply sent"
        );
        DispatchOutcome::Replied {
            chunks: total,
            failed,
        }
    }

    async fn send_notice(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            tracing::warn!(chat_id = chat_id.0, error = %e, "notice delivery failed");
        }
    }
}
