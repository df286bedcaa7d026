use std::{
    env, fs,
    net::{IpAddr, SocketAddr},
    path::Path,
    str::FromStr,
    time::Duration,
};

use crate::{completion::ModelParams, errors::Error, retry::RetryPolicy, Result};

pub const DEFAULT_PORT: u16 = 10_000;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHUNK_LIMIT: usize = 4000;
pub const DEFAULT_EMPTY_TEXT_NOTICE: &str = "Пожалуйста, введи текст запроса.";
pub const DEFAULT_ERROR_NOTICE: &str = "Произошла ошибка, попробуйте позже.";

/// Typed configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Secrets
    pub telegram_bot_token: String,
    pub openai_api_key: String,

    // HTTP surface
    pub webhook_base_url: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub drop_pending_updates: bool,

    // Completion provider
    pub openai_model: String,
    pub openai_base_url: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub completion_timeout: Duration,

    // Dispatch
    pub retry_max_attempts: u32,
    pub retry_delay: Duration,
    pub chunk_limit: usize,
    pub empty_text_notice: String,
    pub error_notice: String,
}

impl Config {
    /// Load from the process environment (plus `./.env` if present).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `load()` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required values
        let telegram_bot_token = required(&get, "BOT_TOKEN")?;
        let openai_api_key = required(&get, "OPENAI_API_KEY")?;
        let webhook_base_url = required(&get, "WEBHOOK_BASE_URL")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(webhook_base_url.starts_with("https://") || webhook_base_url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "WEBHOOK_BASE_URL must be an http(s) URL, got {webhook_base_url:?}"
            )));
        }

        let port = parse_opt::<u16>(&get, "PORT")?.unwrap_or(DEFAULT_PORT);
        let bind_addr =
            parse_opt::<IpAddr>(&get, "BIND_ADDR")?.unwrap_or(IpAddr::from([0, 0, 0, 0]));
        let drop_pending_updates = get("DROP_PENDING_UPDATES")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let openai_model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let system_prompt = get("OPENAI_SYSTEM_PROMPT");
        let max_tokens = parse_opt::<u32>(&get, "OPENAI_MAX_TOKENS")?;
        let temperature = parse_opt::<f32>(&get, "OPENAI_TEMPERATURE")?;
        let completion_timeout =
            Duration::from_secs(parse_opt::<u64>(&get, "COMPLETION_TIMEOUT_SECS")?.unwrap_or(60));

        let retry_max_attempts = parse_opt::<u32>(&get, "RETRY_MAX_ATTEMPTS")?
            .unwrap_or(3)
            .max(1);
        let retry_delay =
            Duration::from_millis(parse_opt::<u64>(&get, "RETRY_DELAY_MS")?.unwrap_or(2000));

        let chunk_limit =
            parse_opt::<usize>(&get, "TELEGRAM_CHUNK_LIMIT")?.unwrap_or(DEFAULT_CHUNK_LIMIT);
        if chunk_limit == 0 || chunk_limit > 4096 {
            return Err(Error::Config(format!(
                "TELEGRAM_CHUNK_LIMIT must be between 1 and 4096, got {chunk_limit}"
            )));
        }

        let empty_text_notice =
            get("EMPTY_TEXT_NOTICE").unwrap_or_else(|| DEFAULT_EMPTY_TEXT_NOTICE.to_string());
        let error_notice = get("ERROR_NOTICE").unwrap_or_else(|| DEFAULT_ERROR_NOTICE.to_string());

        Ok(Self {
            telegram_bot_token,
            openai_api_key,
            webhook_base_url,
            bind_addr,
            port,
            drop_pending_updates,
            openai_model,
            openai_base_url,
            system_prompt,
            max_tokens,
            temperature,
            completion_timeout,
            retry_max_attempts,
            retry_delay,
            chunk_limit,
            empty_text_notice,
            error_notice,
        })
    }

    /// Route the platform posts updates to. Derived from the bot token so a
    /// guessed path is simply unrouted.
    pub fn webhook_path(&self) -> String {
        format!("/webhook/{}", self.telegram_bot_token)
    }

    /// Public callback URL registered with the platform.
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.webhook_base_url, self.webhook_path())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: self.openai_model.clone(),
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            delay: self.retry_delay,
        }
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key}: invalid value {raw:?}: {e}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Apply `KEY=value` pairs from `path` to the process environment.
/// A missing file is fine; variables already set win over the file.
fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };
    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_none() {
            env::set_var(key, val);
        }
    }
}

/// Parse `.env` contents: blank lines and `#` comments are skipped, lines
/// without `=` are ignored, and one pair of matching quotes around the value
/// is stripped.
fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), unquote(v).to_string()))
        .collect()
}

fn unquote(v: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = v.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)) {
            return inner;
        }
    }
    v
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
