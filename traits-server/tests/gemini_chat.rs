use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use traits_gemini::GeminiBuilder;
use traits_server::{AppState, GeminiChat, app_router};
use traits_store::{InMemoryDatasetSource, InMemoryDocumentStore};
use url::Url;

#[derive(Clone, Default)]
struct Captured {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn fake_generate(
    Path(model_call): Path<String>,
    State(captured): State<Captured>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    captured.calls.lock().unwrap().push((model_call, body.clone()));

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    if prompt == "explode" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"message": "internal"}})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Weighing sources...", "thought": true},
                    {"text": "Lions hunt in prides."}
                ], "role": "model"},
                "finishReason": "STOP",
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://a.example/lions", "title": "Lions"}},
                    {"web": {"title": "No uri"}},
                    {"web": {"uri": "https://b.example/prides", "title": "Prides"}}
                ]}
            }]
        })),
    )
}

async fn spawn_fake_gemini() -> (Url, Captured, tokio::task::JoinHandle<()>) {
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

async fn spawn_backend(gemini_base: Url) -> (String, tokio::task::JoinHandle<()>) {
    let gemini = GeminiBuilder::new("test-key").with_base_url(gemini_base).build().unwrap();
    let state = AppState::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(GeminiChat::new(gemini)),
        Arc::new(InMemoryDatasetSource::new()),
    );
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn chat(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/chat"))
        .json(&body)
        .send()
        .await
        .expect("chat response");
    let status = response.status().as_u16();
    (status, response.json().await.expect("chat json"))
}

#[tokio::test]
async fn grounded_chat_requests_search_and_returns_complete_sources() {
    let (gemini_base, captured, gemini) = spawn_fake_gemini().await;
    let (base, backend) = spawn_backend(gemini_base).await;

    let (status, body) = chat(&base, json!({"prompt": "How do lions hunt?", "mode": "grounded"})).await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "text": "Lions hunt in prides.",
            "sources": [
                {"uri": "https://a.example/lions", "title": "Lions"},
                {"uri": "https://b.example/prides", "title": "Prides"}
            ]
        })
    );

    let calls = captured.calls.lock().unwrap();
    let (model_call, request) = &calls[0];
    assert_eq!(model_call, "gemini-2.5-flash:generateContent");
    assert_eq!(request["tools"], json!([{"googleSearch": {}}]));
    assert_eq!(request["safetySettings"].as_array().unwrap().len(), 4);

    backend.abort();
    gemini.abort();
}

#[tokio::test]
async fn thinking_chat_uses_pro_model_with_budget() {
    let (gemini_base, captured, gemini) = spawn_fake_gemini().await;
    let (base, backend) = spawn_backend(gemini_base).await;

    let (status, _) = chat(&base, json!({"prompt": "Compare felid diets", "mode": "thinking"})).await;
    assert_eq!(status, 200);

    let calls = captured.calls.lock().unwrap();
    let (model_call, request) = &calls[0];
    assert_eq!(model_call, "gemini-2.5-pro:generateContent");
    assert_eq!(request["generationConfig"]["temperature"], 0.0);
    assert_eq!(request["generationConfig"]["thinkingConfig"]["thinkingBudget"], 32768);
    assert!(request.get("tools").is_none());

    backend.abort();
    gemini.abort();
}

#[tokio::test]
async fn upstream_failure_becomes_500_chat_reply() {
    let (gemini_base, _captured, gemini) = spawn_fake_gemini().await;
    let (base, backend) = spawn_backend(gemini_base).await;

    let (status, body) = chat(&base, json!({"prompt": "explode", "mode": "standard"})).await;
    assert_eq!(status, 500);
    assert_eq!(body["sources"], json!([]));
    assert!(
        body["text"]
            .as_str()
            .unwrap()
            .starts_with("An error occurred while processing your request: bad response from server; code 500")
    );

    backend.abort();
    gemini.abort();
}
