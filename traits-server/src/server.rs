use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use traits_core::{ChatReply, ChatRequest, DatasetKind, SearchKind, SearchRequest, TraitRecord};
use traits_gemini::GeminiBuilder;
use traits_store::{CloudStorageSource, Collection, DatasetSource, DocumentStore, FirestoreStore};

use crate::{
    chat::{ChatBackend, GeminiChat},
    config::ServerConfig,
    error::{ChatError, DataError, SearchError},
};

/// Shared, immutable handles used by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub chat: Arc<dyn ChatBackend>,
    pub datasets: Arc<dyn DatasetSource>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        chat: Arc<dyn ChatBackend>,
        datasets: Arc<dyn DatasetSource>,
    ) -> Self {
        Self { store, chat, datasets }
    }

    /// Wires the Firestore, Gemini, and Cloud Storage clients from `config`.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let mut store = FirestoreStore::new(&config.project_id)
            .context("invalid Firestore configuration")?
            .with_database(&config.database);
        let mut datasets =
            CloudStorageSource::new(&config.bucket).context("invalid Cloud Storage configuration")?;
        if let Some(token) = &config.access_token {
            store = store.with_access_token(token);
            datasets = datasets.with_access_token(token);
        }
        if let Some(url) = &config.firestore_base_url {
            store = store.with_base_url(url.clone());
        }
        if let Some(url) = &config.storage_base_url {
            datasets = datasets.with_base_url(url.clone());
        }

        let mut gemini = GeminiBuilder::new(&config.api_key);
        if let Some(url) = &config.gemini_base_url {
            gemini = gemini.with_base_url(url.clone());
        }
        let gemini = gemini.build().context("failed to build Gemini client")?;

        Ok(Self::new(Arc::new(store), Arc::new(GeminiChat::new(gemini)), Arc::new(datasets)))
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/search", post(search))
        .route("/api/chat", post(chat))
        .route("/api/data/{kind}", get(dataset))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for traits-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("traits-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"traits-server"}))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<TraitRecord>, SearchError> {
    let kind: SearchKind = request
        .kind
        .parse()
        .map_err(|_| SearchError::BadRequest(format!("Invalid search type '{}'", request.kind)))?;
    if request.query.trim().is_empty() {
        return Err(SearchError::BadRequest("Query is required".to_string()));
    }

    let collection = Collection::for_search(kind, request.is_scientific);
    match state.store.lookup(collection, &request.query).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => {
            info!(%collection, query = %request.query, "no matching document");
            Err(SearchError::NotFound(request.query))
        }
        Err(err) => {
            error!(%collection, error = %err, "trait lookup failed");
            Err(SearchError::Store(err))
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ChatError> {
    if request.prompt.trim().is_empty() {
        return Err(ChatError::EmptyPrompt);
    }

    state.chat.reply(&request.prompt, request.mode).await.map(Json).map_err(|err| {
        error!(mode = %request.mode, error = %err, "Gemini API error");
        ChatError::Model(err.to_string())
    })
}

async fn dataset(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, DataError> {
    let kind: DatasetKind = kind.parse().map_err(|_| {
        warn!(kind = %kind, "unknown dataset requested");
        DataError::UnknownType(kind.clone())
    })?;

    let stream = state.datasets.open(kind).await.map_err(|err| {
        error!(%kind, error = %err, "failed to open dataset");
        DataError::Storage(err)
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], Body::from_stream(stream)).into_response())
}
