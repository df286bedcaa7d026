//! OpenAI adapter (chat completions).
//!
//! Implements the core `CompletionClient` port over the
//! `POST {base}/chat/completions` endpoint and maps HTTP/transport failures
//! onto the typed `CompletionError`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tgpt_core::{
    completion::{CompletionClient, CompletionError, CompletionRequest, CompletionResult},
    errors::Error,
    Result,
};

const ERROR_SNIPPET_LEN: usize = 200;

#[derive(Clone, Debug)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("openai client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

fn build_body(req: &CompletionRequest) -> ChatRequest<'_> {
    let mut messages = Vec::with_capacity(2);
    if let Some(sys) = req.system_prompt.as_deref() {
        messages.push(ChatMessage {
            role: "system",
            content: sys,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &req.prompt,
    });
    ChatRequest {
        model: &req.model,
        messages,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
    }
}

/// Map a non-success HTTP status (and its body) to a typed failure.
pub fn classify_status(status: u16, body: &str) -> CompletionError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    let message = message.chars().take(ERROR_SNIPPET_LEN).collect::<String>();

    match status {
        401 | 403 => CompletionError::Auth { status },
        // Exhausted quota also comes back as 429 but will not clear by waiting.
        429 if parsed
            .as_ref()
            .and_then(|e| e.error.code.as_deref())
            .is_some_and(|c| c == "insufficient_quota") =>
        {
            CompletionError::Rejected { status, message }
        }
        429 => CompletionError::RateLimited,
        500..=599 => CompletionError::Server { status },
        _ => CompletionError::Rejected { status, message },
    }
}

fn classify_transport(e: &reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Network(e.to_string())
    }
}

/// Pull the first choice's text out of a successful response body.
pub fn parse_completion(body: &str) -> CompletionResult {
    let resp: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(format!("invalid json: {e}")))?;
    let text = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(CompletionError::MalformedResponse(
            "empty message content".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, req: &CompletionRequest) -> CompletionResult {
        let body = build_body(req);
        tracing::debug!(model = %req.model, prompt_chars = req.prompt.chars().count(), "openai chat request");

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            let err = classify_status(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), error = %err, "openai request failed");
            return Err(err);
        }

        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(system: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            system_prompt: system.map(str::to_string),
            prompt: "hello".into(),
            max_tokens: None,
            temperature: Some(0.5),
        }
    }

    #[test]
    fn body_has_user_message_and_skips_unset_params() {
        let r = req(None);
        let v = serde_json::to_value(build_body(&r)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn system_prompt_goes_first() {
        let r = req(Some("be brief"));
        let v = serde_json::to_value(build_body(&r)).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][0]["content"], "be brief");
        assert_eq!(v["messages"][1]["role"], "user");
    }

    #[test]
    fn classifies_statuses() {
        assert_eq!(classify_status(401, ""), CompletionError::Auth { status: 401 });
        assert_eq!(classify_status(429, "{}"), CompletionError::RateLimited);
        assert_eq!(classify_status(503, ""), CompletionError::Server { status: 503 });
        assert_eq!(
            classify_status(400, r#"{"error":{"message":"bad model"}}"#),
            CompletionError::Rejected {
                status: 400,
                message: "bad model".into()
            }
        );
    }

    #[test]
    fn exhausted_quota_is_not_transient() {
        let err = classify_status(
            429,
            r#"{"error":{"message":"quota","code":"insufficient_quota"}}"#,
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#;
        assert_eq!(parse_completion(body), Ok("Hi!".to_string()));
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion("<html>"),
            Err(CompletionError::MalformedResponse(_))
        ));
    }
}
