//! Inbound webhook payload.
//!
//! Only the handful of Telegram `Update` fields the bot reads are modelled;
//! everything else in the payload is ignored.

use serde::Deserialize;

use crate::{
    domain::{ChatId, UpdateId},
    errors::Error,
    Result,
};

/// One inbound text-capable event, ready for dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: UpdateId,
    pub chat_id: ChatId,
    pub sender: String,
    pub text: Option<String>,
}

impl InboundUpdate {
    /// The message text exactly as sent, or `None` when it is missing or
    /// blank. Whitespace only decides emptiness; it is never stripped, so
    /// indented code reaches the model intact.
    pub fn prompt_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Result of parsing a webhook body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedUpdate {
    /// A message update that must be answered.
    Message(InboundUpdate),
    /// A well-formed update of a kind the bot does not handle
    /// (edited message, callback query, channel post, ...).
    Ignored(UpdateId),
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    from: Option<RawUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl RawUser {
    fn display_name(&self) -> String {
        let first = self.first_name.trim();
        let full = match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() && !first.is_empty() => format!("{first} {last}"),
            Some(last) if !last.is_empty() => last.to_string(),
            _ => first.to_string(),
        };
        if !full.is_empty() {
            return full;
        }
        match self.username.as_deref() {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ => "unknown".to_string(),
        }
    }
}

/// Parse a raw webhook body.
///
/// Invalid JSON, a missing `update_id`, or a message without `chat.id` is a
/// [`Error::MalformedUpdate`].
pub fn parse_update(body: &[u8]) -> Result<ParsedUpdate> {
    let raw: RawUpdate =
        serde_json::from_slice(body).map_err(|e| Error::MalformedUpdate(e.to_string()))?;
    let update_id = UpdateId(raw.update_id);

    let Some(msg) = raw.message else {
        return Ok(ParsedUpdate::Ignored(update_id));
    };

    let sender = msg
        .from
        .as_ref()
        .map(RawUser::display_name)
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ParsedUpdate::Message(InboundUpdate {
        update_id,
        chat_id: ChatId(msg.chat.id),
        sender,
        text: msg.text,
    }))
}
