//! Exercises `OpenAiClient` against a local axum stub of the chat-completions endpoint.

use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tgpt_core::completion::{CompletionClient, CompletionError, CompletionRequest};
use tgpt_openai::OpenAiClient;

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1")
}

fn client(base_url: &str, timeout: Duration) -> OpenAiClient {
    OpenAiClient::new("sk-test", base_url, timeout).expect("client")
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-3.5-turbo".into(),
        system_prompt: None,
        prompt: "Привет".into(),
        max_tokens: Some(64),
        temperature: None,
    }
}

#[tokio::test]
async fn returns_generated_text() {
    async fn handler(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer sk-test" {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "no"}})));
        }
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["content"], "Привет");
        (
            StatusCode::OK,
            Json(json!({
                "id": "chatcmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Здравствуйте!"}}]
            })),
        )
    }

    let base = spawn_stub(Router::new().route("/v1/chat/completions", post(handler))).await;
    let out = client(&base, Duration::from_secs(5))
        .complete(&request())
        .await;
    assert_eq!(out, Ok("Здравствуйте!".to_string()));
}

#[tokio::test]
async fn server_error_is_transient() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let base = spawn_stub(app).await;
    let err = client(&base, Duration::from_secs(5))
        .complete(&request())
        .await
        .unwrap_err();
    assert_eq!(err, CompletionError::Server { status: 502 });
    assert!(err.is_transient());
}

#[tokio::test]
async fn bad_key_is_auth_failure() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided"}})),
            )
        }),
    );
    let base = spawn_stub(app).await;
    let err = client(&base, Duration::from_secs(5))
        .complete(&request())
        .await
        .unwrap_err();
    assert_eq!(err, CompletionError::Auth { status: 401 });
    assert!(!err.is_transient());
}

#[tokio::test]
async fn slow_provider_times_out() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "late"
        }),
    );
    let base = spawn_stub(app).await;
    let err = client(&base, Duration::from_millis(100))
        .complete(&request())
        .await
        .unwrap_err();
    assert_eq!(err, CompletionError::Timeout);
}

#[tokio::test]
async fn unreachable_provider_is_network_failure() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        l.local_addr().expect("addr").port()
    };
    let err = client(&format!("http://127.0.0.1:{port}/v1"), Duration::from_secs(2))
        .complete(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Network(_)), "{err:?}");
}
