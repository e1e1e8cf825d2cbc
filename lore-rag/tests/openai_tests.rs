//! OpenAI gateway bindings against an in-process fake server.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use lore_rag::{
    EmbeddingProvider, LanguageModel, LoreConfig, OpenAIChatModel, OpenAIEmbeddingProvider,
    RagError,
};
use serde_json::{Value, json};

const KEY: &str = "sk-test";

async fn spawn_server(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{addr}/v1"), handle)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer sk-test")
}

/// Embeds each input as `[len, index]`, listed in reverse order.
async fn embeddings(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
        );
    }
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, text)| {
            let len = text.as_str().map_or(0, str::len);
            json!({ "object": "embedding", "index": i, "embedding": [len as f32, i as f32] })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "object": "list", "model": body["model"], "data": data })))
}

/// Replies with the model name, temperature and prompt it received.
async fn chat(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "bad key" } })));
    }
    let content = format!(
        "{}|{}|{}",
        body["model"].as_str().unwrap_or_default(),
        body["temperature"],
        body["messages"][0]["content"].as_str().unwrap_or_default()
    );
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })),
    )
}

fn fake_openai() -> Router {
    Router::new().route("/v1/embeddings", post(embeddings)).route("/v1/chat/completions", post(chat))
}

fn config(base: &str, key: &str) -> LoreConfig {
    LoreConfig::builder()
        .api_base(base)
        .api_key(key)
        .embedding_model("text-embedding-3-small")
        .generation_model("gpt-4o-mini")
        .temperature(0.0)
        .build()
        .unwrap()
}

#[tokio::test]
async fn embed_batch_returns_vectors_in_input_order() {
    let (base, handle) = spawn_server(fake_openai()).await;
    let provider = OpenAIEmbeddingProvider::from_config(&config(&base, KEY)).unwrap();

    let vectors = provider.embed_batch(&["a", "bbb", "cc"]).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![3.0, 1.0], vec![2.0, 2.0]]);

    let single = provider.embed("hello").await.unwrap();
    assert_eq!(single, vec![5.0, 0.0]);

    handle.abort();
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    let provider = OpenAIEmbeddingProvider::new(KEY).unwrap().with_base_url("http://127.0.0.1:1/v1");
    assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_key_is_an_embedding_error_with_the_api_message() {
    let (base, handle) = spawn_server(fake_openai()).await;
    let provider = OpenAIEmbeddingProvider::from_config(&config(&base, "sk-wrong")).unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    match err {
        RagError::EmbeddingError { message, .. } => {
            assert!(message.contains("401"), "message: {message}");
            assert!(message.contains("Incorrect API key provided"), "message: {message}");
        }
        other => panic!("expected EmbeddingError, got {other:?}"),
    }

    handle.abort();
}

#[tokio::test]
async fn chat_sends_one_user_message_with_configured_model() {
    let (base, handle) = spawn_server(fake_openai()).await;
    let model = OpenAIChatModel::from_config(&config(&base, KEY)).unwrap();

    let reply = model.complete("What animal is lazy?").await.unwrap();
    assert_eq!(reply, "gpt-4o-mini|0.0|What animal is lazy?");

    handle.abort();
}

#[tokio::test]
async fn chat_failure_is_a_generation_error() {
    let (base, handle) = spawn_server(fake_openai()).await;
    let model = OpenAIChatModel::from_config(&config(&base, "sk-wrong")).unwrap();

    let err = model.complete("hi").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationError { .. }), "got {err:?}");

    handle.abort();
}

#[tokio::test]
async fn unreachable_server_is_reported_not_panicked() {
    let provider = OpenAIEmbeddingProvider::new(KEY).unwrap().with_base_url("http://127.0.0.1:1/v1");
    let err = provider.embed("hello").await.unwrap_err();
    assert!(
        matches!(err, RagError::EmbeddingError { .. } | RagError::GatewayError { .. }),
        "got {err:?}"
    );
}

/// Answers after two seconds, long past the client timeouts below.
fn slow_openai() -> Router {
    async fn slow() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(2)).await;
        (StatusCode::OK, Json(json!({})))
    }
    Router::new().route("/v1/embeddings", post(slow)).route("/v1/chat/completions", post(slow))
}

#[tokio::test]
async fn embedding_timeout_is_a_gateway_error() {
    let (base, handle) = spawn_server(slow_openai()).await;
    let provider = OpenAIEmbeddingProvider::from_config(&config(&base, KEY))
        .unwrap()
        .with_timeout(Duration::from_millis(100))
        .unwrap();

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagError::GatewayError { .. }), "got {err:?}");
    assert!(err.to_string().contains("timed out"), "got {err}");

    handle.abort();
}

#[tokio::test]
async fn chat_timeout_is_a_gateway_error() {
    let (base, handle) = spawn_server(slow_openai()).await;
    let model = OpenAIChatModel::from_config(&config(&base, KEY))
        .unwrap()
        .with_timeout(Duration::from_millis(100))
        .unwrap();

    let err = model.complete("hi").await.unwrap_err();
    assert!(matches!(err, RagError::GatewayError { .. }), "got {err:?}");

    handle.abort();
}
