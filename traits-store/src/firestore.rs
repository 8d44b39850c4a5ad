//! Firestore backend using the REST `runQuery` endpoint.
//!
//! Each lookup is one structured query: a single `EQUAL` field filter on the
//! requested collection with `limit: 1`. Firestore's typed values
//! (`stringValue`, `integerValue`, `arrayValue`, ...) are flattened into plain
//! JSON so that records reach clients exactly as they would from the
//! Firestore SDKs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};
use tracing::{debug, error};
use traits_core::TraitRecord;
use url::Url;

use crate::collection::Collection;
use crate::document::DocumentStore;
use crate::error::{Result, StoreError};

const BACKEND: &str = "Firestore";

/// Public Firestore REST endpoint.
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/";

/// Database id used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";

/// A [`DocumentStore`] backed by a Firestore database.
///
/// # Configuration
///
/// - `project_id` – required.
/// - `database` – defaults to `(default)`.
/// - `access_token` – OAuth bearer token; omit when talking to the emulator.
/// - `base_url` – defaults to the public endpoint; point it at an emulator or a
///   test double with [`with_base_url`](Self::with_base_url).
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    database: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(StoreError::Config("Firestore project id must not be empty".into()));
        }
        let base_url = Url::parse(DEFAULT_FIRESTORE_URL)
            .map_err(|e| StoreError::Config(format!("invalid Firestore URL: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            project_id,
            database: DEFAULT_DATABASE.to_string(),
            access_token: None,
        })
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
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

    fn run_query_url(&self) -> Result<Url> {
        let suffix = format!(
            "v1/projects/{}/databases/{}/documents:runQuery",
            self.project_id, self.database
        );
        self.base_url
            .join(&suffix)
            .map_err(|e| StoreError::Config(format!("invalid Firestore query URL '{suffix}': {e}")))
    }
}

// ── Firestore REST request/response types ──────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest {
    structured_query: Value,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Builds the structured query for a single exact-match lookup.
pub(crate) fn exact_match_query(collection: Collection, field: &str, value: &str) -> Value {
    json!({
        "from": [{"collectionId": collection.as_ref()}],
        "where": {
            "fieldFilter": {
                "field": {"fieldPath": quote_field_path(field)},
                "op": "EQUAL",
                "value": {"stringValue": value}
            }
        },
        "limit": 1
    })
}

/// Quotes a field name for use in a Firestore field path.
///
/// Simple identifiers pass through unchanged; anything else (spaces, dots,
/// dashes) is wrapped in backticks with backticks and backslashes escaped.
pub(crate) fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        return field.to_string();
    }
    let escaped = field.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}

/// Converts one Firestore typed value into plain JSON.
pub(crate) fn decode_value(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::decode(BACKEND, format!("expected typed value, got {value}")))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::decode(BACKEND, "empty typed value"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "integerValue" => match inner {
            Value::String(text) => text
                .parse::<i64>()
                .map(|n| Value::Number(Number::from(n)))
                .map_err(|e| StoreError::decode(BACKEND, format!("bad integerValue '{text}': {e}"))),
            Value::Number(_) => Ok(inner.clone()),
            other => Err(StoreError::decode(BACKEND, format!("bad integerValue {other}"))),
        },
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner.get("values").and_then(Value::as_array);
            values
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()
                .map(|decoded| Value::Array(decoded.unwrap_or_default()))
        }
        "mapValue" => {
            let fields = inner.get("fields").and_then(Value::as_object);
            decode_fields(fields.cloned().unwrap_or_default()).map(Value::Object)
        }
        other => Err(StoreError::decode(BACKEND, format!("unsupported value type '{other}'"))),
    }
}

fn decode_fields(fields: Map<String, Value>) -> Result<Map<String, Value>> {
    fields
        .into_iter()
        .map(|(name, value)| decode_value(&value).map(|decoded| (name, decoded)))
        .collect()
}

// ── DocumentStore implementation ───────────────────────────────────

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<TraitRecord>> {
        debug!(backend = BACKEND, collection = %collection, field, "running exact-match query");

        let url = self.run_query_url()?;
        let body = RunQueryRequest { structured_query: exact_match_query(collection, field, value) };

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "request failed");
            StoreError::backend(BACKEND, format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

            error!(backend = BACKEND, %status, "API error");
            return Err(StoreError::backend(BACKEND, format!("API returned {status}: {detail}")));
        }

        let items: Vec<RunQueryItem> = response.json().await.map_err(|e| {
            error!(backend = BACKEND, error = %e, "failed to parse response");
            StoreError::decode(BACKEND, format!("failed to parse response: {e}"))
        })?;

        match items.into_iter().find_map(|item| item.document) {
            Some(document) => Ok(Some(TraitRecord::from(decode_fields(document.fields)?))),
            None => Ok(None),
        }
    }
}
