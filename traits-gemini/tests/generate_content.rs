use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use traits_gemini::{Error, Gemini, GeminiBuilder, Model};
use url::Url;

#[derive(Clone, Default)]
struct Captured {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn fake_generate(
    Path(model_call): Path<String>,
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()).map(str::to_string);
    captured.calls.lock().unwrap().push((model_call.clone(), key, body));

    if model_call.starts_with("broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"message": "backend exploded"}})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Lions eat meat."}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
        })),
    )
}

async fn spawn_fake() -> (Url, Captured, tokio::task::JoinHandle<()>) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1beta/models/{model_call}", post(fake_generate))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (Url::parse(&format!("http://{addr}/v1beta/")).unwrap(), captured, handle)
}

#[tokio::test]
async fn generate_content_posts_to_model_endpoint_with_api_key() {
    let (base, captured, handle) = spawn_fake().await;
    let gemini = GeminiBuilder::new("test-key").with_base_url(base).build().unwrap();

    let response = gemini
        .generate_content()
        .with_model(Model::Gemini25Pro)
        .with_user_message("What do lions eat?")
        .execute()
        .await
        .unwrap();

    assert_eq!(response.text(), "Lions eat meat.");

    let calls = captured.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (path, key, body) = &calls[0];
    assert_eq!(path, "gemini-2.5-pro:generateContent");
    assert_eq!(key.as_deref(), Some("test-key"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "What do lions eat?");

    handle.abort();
}

#[tokio::test]
async fn non_success_status_becomes_bad_response() {
    let (base, _captured, handle) = spawn_fake().await;
    let gemini = Gemini::with_base_url("test-key", base).unwrap();

    let error = gemini
        .generate_content()
        .with_model("broken-model")
        .with_user_message("hello")
        .execute()
        .await
        .unwrap_err();

    match error {
        Error::BadResponse { code, description } => {
            assert_eq!(code, 500);
            assert!(description.unwrap_or_default().contains("backend exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }

    handle.abort();
}
