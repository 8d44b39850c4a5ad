//! HTTP access to the traits backend.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use traits_core::{ChatReply, ChatRequest, DatasetKind, SearchRequest, TraitRecord};
use url::Url;

use crate::error::{ClientError, Result};

/// The three backend calls the client makes.
#[async_trait]
pub trait TraitsBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<TraitRecord>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    async fn dataset(&self, kind: DatasetKind) -> Result<Value>;
}

/// [`TraitsBackend`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { client: reqwest::Client::new(), base_url }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Turns a non-success response into [`ClientError::Status`], preferring
    /// the backend's own `message` (or chat `text`) over a generic one.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("text")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!body.trim().is_empty() && parsed.is_none()).then(|| body.clone()))
            .unwrap_or_else(|| format!("Server responded with status: {}", status.as_u16()));

        Err(ClientError::Status { status: status.as_u16(), message })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TraitsBackend for HttpBackend {
    #[instrument(skip_all, fields(kind = %request.kind, is_scientific = request.is_scientific))]
    async fn search(&self, request: &SearchRequest) -> Result<TraitRecord> {
        let url = self.endpoint("api/search")?;
        debug!(%url, "sending search");
        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    #[instrument(skip_all, fields(mode = %request.mode))]
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint("api/chat")?;
        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn dataset(&self, kind: DatasetKind) -> Result<Value> {
        let url = self.endpoint(&format!("api/data/{kind}"))?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }
}

/// The three static datasets, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct Datasets {
    pub vernacular: Value,
    pub scientific: Value,
    pub phylo: Value,
}

/// Fetches all three datasets concurrently; the first failure fails the load.
pub async fn fetch_datasets<B>(backend: &B) -> Result<Datasets>
where
    B: TraitsBackend + ?Sized,
{
    let (vernacular, scientific, phylo) = tokio::try_join!(
        backend.dataset(DatasetKind::Vernacular),
        backend.dataset(DatasetKind::Scientific),
        backend.dataset(DatasetKind::Phylo),
    )?;
    Ok(Datasets { vernacular, scientific, phylo })
}
