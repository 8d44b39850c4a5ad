//! Cloud Storage backend for the static datasets.

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, error};
use traits_core::DatasetKind;
use url::Url;

use crate::dataset::{ByteStream, DatasetSource, object_path};
use crate::error::{Result, StoreError};

const BACKEND: &str = "Cloud Storage";

/// Bucket holding the trait datasets.
pub const DEFAULT_BUCKET: &str = "eol_dataset";

/// Public Cloud Storage JSON API endpoint.
pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com/";

/// Reads dataset objects with a media download (`alt=media`) and forwards the
/// body chunk by chunk.
#[derive(Debug, Clone)]
pub struct CloudStorageSource {
    client: reqwest::Client,
    base_url: Url,
    bucket: String,
    access_token: Option<String>,
}

impl CloudStorageSource {
    pub fn new(bucket: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket name must not be empty".into()));
        }
        let base_url = Url::parse(DEFAULT_STORAGE_URL)
            .map_err(|e| StoreError::Config(format!("invalid Cloud Storage URL: {e}")))?;

        Ok(Self { client: reqwest::Client::new(), base_url, bucket, access_token: None })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Media download URL; the object name is a single encoded path segment.
    pub(crate) fn media_url(&self, object: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", object]);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }
}

#[async_trait]
impl DatasetSource for CloudStorageSource {
    async fn open(&self, kind: DatasetKind) -> Result<ByteStream> {
        let object = object_path(kind);
        debug!(backend = BACKEND, bucket = %self.bucket, object, "opening dataset");

        let url = self.media_url(object)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "request failed");
            StoreError::backend(BACKEND, format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(backend = BACKEND, %status, object, "download rejected");
            return Err(StoreError::backend(
                BACKEND,
                format!("download of {object} returned {status}: {body}"),
            ));
        }

        let stream = response.bytes_stream().map_ok(|chunk| chunk.to_vec()).map_err(|e| {
            error!(backend = BACKEND, error = %e, "stream interrupted");
            StoreError::backend(BACKEND, format!("stream interrupted: {e}"))
        });
        Ok(Box::pin(stream))
    }
}
