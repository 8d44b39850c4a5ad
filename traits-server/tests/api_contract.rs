use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use traits_core::{ChatMode, ChatReply, DatasetKind, GroundingSource, TraitRecord};
use traits_gemini::Error as GeminiError;
use traits_server::{AppState, ChatBackend, app_router};
use traits_store::{
    Collection, DocumentStore, InMemoryDatasetSource, InMemoryDocumentStore, LOOKUP_FIELD,
    StoreError,
};

#[derive(Default)]
struct StubChat {
    calls: Mutex<Vec<(String, ChatMode)>>,
}

#[async_trait]
impl ChatBackend for StubChat {
    async fn reply(&self, prompt: &str, mode: ChatMode) -> Result<ChatReply, GeminiError> {
        self.calls.lock().unwrap().push((prompt.to_string(), mode));
        if prompt == "fail" {
            return Err(GeminiError::BadResponse { code: 503, description: Some("overloaded".into()) });
        }
        let sources = match mode {
            ChatMode::Grounded => vec![GroundingSource {
                uri: "https://example.com/lion".into(),
                title: "Lion".into(),
            }],
            _ => Vec::new(),
        };
        Ok(ChatReply { text: format!("echo: {prompt}"), sources })
    }
}

struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn find_one(
        &self,
        _collection: Collection,
        _field: &str,
        _value: &str,
    ) -> traits_store::Result<Option<TraitRecord>> {
        Err(StoreError::Backend { backend: "test".into(), message: "connection reset".into() })
    }
}

fn lion() -> TraitRecord {
    TraitRecord::new()
        .with_field(LOOKUP_FIELD, "lion")
        .with_field("diet", "carnivore")
        .with_field("habitat", json!(["savanna", "grassland"]))
}

fn fixture_state(chat: Arc<StubChat>) -> AppState {
    let store = InMemoryDocumentStore::new()
        .with_record(Collection::PerVernacularName, lion())
        .with_record(
            Collection::PerScientificName,
            TraitRecord::new().with_field(LOOKUP_FIELD, "panthera leo").with_field("diet", "carnivore"),
        )
        .with_record(
            Collection::PhylogeneticTree,
            TraitRecord::new().with_field(LOOKUP_FIELD, "felidae").with_field("rank", "family"),
        );
    let datasets = InMemoryDatasetSource::new()
        .with_dataset(DatasetKind::Phylo, br#"{"felidae":{"diet":"carnivore"}}"#.to_vec());

    AppState::new(Arc::new(store), chat, Arc::new(datasets))
}

async fn spawn_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("response");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn health_reports_service() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let body: Value = reqwest::get(format!("{base}/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "service": "traits-server"}));

    handle.abort();
}

#[tokio::test]
async fn search_routes_to_collection_and_returns_record_verbatim() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let (status, body) =
        post_json(&base, "/api/search", json!({"query": "lion", "type": "species", "isScientific": false}))
            .await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({"Document name": "lion", "diet": "carnivore", "habitat": ["savanna", "grassland"]})
    );

    let (status, body) = post_json(
        &base,
        "/api/search",
        json!({"query": "panthera leo", "type": "species", "isScientific": true}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["Document name"], "panthera leo");

    // The scientific flag is ignored for phylogenetic searches.
    let (status, body) =
        post_json(&base, "/api/search", json!({"query": "felidae", "type": "phylo", "isScientific": true}))
            .await;
    assert_eq!(status, 200);
    assert_eq!(body["rank"], "family");

    handle.abort();
}

#[tokio::test]
async fn search_misses_are_404_with_message() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/search",
        json!({"query": "zzzznotaspecies", "type": "species", "isScientific": false}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"message": "No document found for 'zzzznotaspecies'"}));

    // Vernacular names are not found in the scientific collection.
    let (status, _) =
        post_json(&base, "/api/search", json!({"query": "lion", "type": "species", "isScientific": true}))
            .await;
    assert_eq!(status, 404);

    handle.abort();
}

#[tokio::test]
async fn search_rejects_bad_input_with_400() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let (status, body) = post_json(&base, "/api/search", json!({"query": "lion", "type": "genus"})).await;
    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("genus"));

    let (status, body) = post_json(&base, "/api/search", json!({"query": "   ", "type": "species"})).await;
    assert_eq!(status, 400);
    assert!(body["message"].is_string());

    let (status, body) =
        post_json(&base, "/api/search", json!({"query": null, "type": "species"})).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"message": "Query is required"}));

    let (status, body) = post_json(&base, "/api/search", json!({"query": "lion", "type": null})).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"message": "Invalid search type ''"}));

    handle.abort();
}

#[tokio::test]
async fn null_scientific_flag_searches_vernacular_names() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let (status, body) =
        post_json(&base, "/api/search", json!({"query": "lion", "type": "species", "isScientific": null}))
            .await;
    assert_eq!(status, 200);
    assert_eq!(body["diet"], "carnivore");

    handle.abort();
}

#[tokio::test]
async fn store_failures_are_500_with_generic_message() {
    let state = AppState::new(
        Arc::new(BrokenStore),
        Arc::new(StubChat::default()),
        Arc::new(InMemoryDatasetSource::new()),
    );
    let (base, handle) = spawn_server(state).await;

    let (status, body) =
        post_json(&base, "/api/search", json!({"query": "lion", "type": "species", "isScientific": false}))
            .await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"message": "Failed to query the trait database"}));

    handle.abort();
}

#[tokio::test]
async fn chat_forwards_prompt_and_mode() {
    let chat = Arc::new(StubChat::default());
    let (base, handle) = spawn_server(fixture_state(chat.clone())).await;

    let (status, body) =
        post_json(&base, "/api/chat", json!({"prompt": "What do lions eat?", "mode": "grounded"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["text"], "echo: What do lions eat?");
    assert_eq!(body["sources"], json!([{"uri": "https://example.com/lion", "title": "Lion"}]));

    let (status, body) = post_json(&base, "/api/chat", json!({"prompt": "hi", "mode": "warp"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["sources"], json!([]));

    let calls = chat.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            ("What do lions eat?".to_string(), ChatMode::Grounded),
            ("hi".to_string(), ChatMode::Standard),
        ]
    );

    handle.abort();
}

#[tokio::test]
async fn chat_without_prompt_is_rejected_before_the_model() {
    let chat = Arc::new(StubChat::default());
    let (base, handle) = spawn_server(fixture_state(chat.clone())).await;

    for body in [
        json!({"mode": "standard"}),
        json!({"prompt": "", "mode": "thinking"}),
        json!({"prompt": null, "mode": "standard"}),
        json!({"prompt": "   ", "mode": "grounded"}),
        json!({"prompt": 12}),
    ] {
        let (status, reply) = post_json(&base, "/api/chat", body).await;
        assert_eq!(status, 400);
        assert_eq!(reply, json!({"text": "Prompt is required", "sources": []}));
    }
    assert!(chat.calls.lock().unwrap().is_empty());

    handle.abort();
}

#[tokio::test]
async fn chat_model_errors_are_500_with_error_text() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let (status, body) = post_json(&base, "/api/chat", json!({"prompt": "fail"})).await;
    assert_eq!(status, 500);
    assert_eq!(body["sources"], json!([]));
    let text = body["text"].as_str().unwrap();
    assert!(text.starts_with("An error occurred while processing your request: "));
    assert!(text.contains("overloaded"));

    handle.abort();
}

#[tokio::test]
async fn data_endpoint_streams_json_and_maps_errors() {
    let (base, handle) = spawn_server(fixture_state(Arc::default())).await;

    let response = reqwest::get(format!("{base}/api/data/phylo")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.text().await.unwrap(), r#"{"felidae":{"diet":"carnivore"}}"#);

    let response = reqwest::get(format!("{base}/api/data/genes")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), "Data type not found");

    // Known type, but nothing stored behind it.
    let response = reqwest::get(format!("{base}/api/data/vernacular")).await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().await.unwrap(), "Failed to fetch data from storage");

    handle.abort();
}
