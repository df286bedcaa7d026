//! Completion-provider port.
//!
//! The OpenAI adapter lives in `tgpt-openai`; tests substitute fakes.

use async_trait::async_trait;

/// One prompt plus the fixed model parameters it is sent with.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Fixed per-process model parameters. `request()` stamps a prompt with them.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ModelParams {
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            prompt: prompt.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Typed provider failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("authentication rejected ({status})")]
    Auth { status: u16 },

    #[error("rate limited")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("provider server error ({status})")]
    Server { status: u16 },

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Whether another attempt may succeed without changing the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited
                | CompletionError::Network(_)
                | CompletionError::Timeout
                | CompletionError::Server { .. }
        )
    }
}

pub type CompletionResult = std::result::Result<String, CompletionError>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Submit one chat-style prompt, returning the generated text.
    async fn complete(&self, req: &CompletionRequest) -> CompletionResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CompletionError::Timeout.is_transient());
        assert!(CompletionError::RateLimited.is_transient());
        assert!(CompletionError::Network("reset".into()).is_transient());
        assert!(CompletionError::Server { status: 502 }.is_transient());

        assert!(!CompletionError::Auth { status: 401 }.is_transient());
        assert!(!CompletionError::MalformedResponse("no choices".into()).is_transient());
        assert!(!CompletionError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
    }

    #[test]
    fn params_stamp_the_prompt() {
        let params = ModelParams {
            model: "gpt-3.5-turbo".into(),
            system_prompt: Some("be brief".into()),
            max_tokens: Some(100),
            temperature: None,
        };
        let req = params.request("hello");
        assert_eq!(req.prompt, "hello");
        assert_eq!(req.model, "gpt-3.5-turbo");
        assert_eq!(req.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(req.max_tokens, Some(100));
    }
}
