use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
///
/// Default: info for our crates, warn for everything else. Can be overridden
/// with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tgpt=info,tgpt_core=info,tgpt_openai=info,tgpt_telegram=info,{service_name}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::External(format!("logging init failed: {e}")))
}

/// Replace every occurrence of `secret` in `s` with a short masked form.
///
/// Used for log lines that would otherwise contain the bot token (the
/// webhook path is derived from it).
pub fn mask_secret(s: &str, secret: &str) -> String {
    if secret.is_empty() {
        return s.to_string();
    }
    let head: String = secret.chars().take(4).collect();
    s.replace(secret, &format!("{head}***"))
}
