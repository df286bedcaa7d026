use std::sync::Arc;

use tgpt_core::{config::Config, context::AppContext};
use tgpt_openai::OpenAiClient;
use tgpt_telegram::{server, TelegramMessenger};

#[tokio::main]
async fn main() -> Result<(), tgpt_core::Error> {
    tgpt_core::logging::init("tgpt")?;

    let cfg = Arc::new(Config::load()?);

    let completion = Arc::new(OpenAiClient::new(
        cfg.openai_api_key.clone(),
        cfg.openai_base_url.clone(),
        cfg.completion_timeout,
    )?);
    let telegram = Arc::new(TelegramMessenger::from_token(cfg.telegram_bot_token.clone()));

    tracing::info!(model = %cfg.openai_model, "starting tgpt");
    let ctx = AppContext::new(cfg, telegram.clone(), telegram, completion);

    server::run_webhook_server(ctx)
        .await
        .map_err(|e| tgpt_core::Error::External(format!("webhook server failed: {e}")))?;

    Ok(())
}
