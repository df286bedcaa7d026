use std::future::Future;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use tgpt_core::{context::AppContext, logging::mask_secret, receiver::HandleOutcome};

pub const HEALTH_BODY: &str = "running";

/// Routing table:
///
/// | method | path               | handler   |
/// |--------|--------------------|-----------|
/// | GET    | `/`                | `health`  |
/// | POST   | `/webhook/<token>` | `webhook` |
///
/// The token segment is captured and compared with the configured bot token
/// (the token itself contains `:`); any other value, and any method other
/// than POST, is answered exactly like an unrouted path.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/webhook/:token", post(webhook).fallback(not_found))
        .with_state(ctx)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn health() -> &'static str {
    HEALTH_BODY
}

async fn webhook(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    body: Bytes,
) -> Response {
    if token != ctx.cfg.telegram_bot_token {
        return StatusCode::NOT_FOUND.into_response();
    }

    match ctx.receiver.handle_request(&body).await {
        Ok(HandleOutcome::Ignored) => (StatusCode::OK, "ok").into_response(),
        Ok(HandleOutcome::Dispatched(outcome)) => {
            tracing::debug!(?outcome, "update handled");
            (StatusCode::OK, "ok").into_response()
        }
        // Non-2xx lets Telegram redeliver; the receiver already logged the payload.
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// Registers the webhook once the listener is accepting, and deregisters it
/// after the server has drained.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        path = %mask_secret(&ctx.cfg.webhook_path(), &ctx.cfg.telegram_bot_token),
        "webhook server listening"
    );

    ctx.receiver
        .register_webhook(&ctx.cfg.webhook_url())
        .await
        .map_err(|e| anyhow::anyhow!("webhook registration failed: {e}"))?;

    let result = axum::serve(listener, build_router(ctx.clone()))
        .with_graceful_shutdown(shutdown)
        .await;

    tracing::info!("webhook server stopped");
    ctx.receiver.deregister_webhook().await;

    result?;
    Ok(())
}

/// Bind the configured address and serve until SIGINT/SIGTERM.
pub async fn run_webhook_server(ctx: AppContext) -> anyhow::Result<()> {
    let listener = TcpListener::bind(ctx.cfg.listen_addr()).await?;
    serve(listener, ctx, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
