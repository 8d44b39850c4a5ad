//! JSON bodies exchanged between the client and the backend.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What a lookup searches for: a single species or a phylogenetic group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchKind {
    Species,
    Phylo,
}

/// Body of `POST /api/search`.
///
/// `kind` is carried as a raw string so that the backend can answer an
/// unrecognized value with a 400 instead of a deserialization rejection.
/// Null or mistyped fields read as empty strings and `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub query: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_scientific: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, kind: SearchKind, is_scientific: bool) -> Self {
        Self { query: query.into(), kind: kind.to_string(), is_scientific }
    }
}

/// Generic `{ "message": ... }` body used by lookup error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Chat mode selected for a single turn.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Standard,
    Grounded,
    Thinking,
}

impl ChatMode {
    pub const ALL: [ChatMode; 3] = [ChatMode::Standard, ChatMode::Grounded, ChatMode::Thinking];

    /// Label shown next to the mode selector.
    pub fn label(self) -> &'static str {
        match self {
            ChatMode::Standard => "Standard",
            ChatMode::Grounded => "Grounded Search",
            ChatMode::Thinking => "Deep Analysis",
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Null or non-string prompts read as empty.
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: String,
    /// Missing, null, or unrecognized modes fall back to [`ChatMode::Standard`].
    #[serde(default, deserialize_with = "lenient_mode")]
    pub mode: ChatMode,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>, mode: ChatMode) -> Self {
        Self { prompt: prompt.into(), mode }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(text)) => text,
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(matches!(raw, Some(serde_json::Value::Bool(true))))
}

fn lenient_mode<'de, D>(deserializer: D) -> Result<ChatMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|mode| mode.parse().ok())
        .unwrap_or_default())
}

/// A web citation returned alongside a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// Body of every `/api/chat` response, successful or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

impl ChatReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), sources: Vec::new() }
    }
}
