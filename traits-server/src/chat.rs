//! Chat modes and the Gemini-backed chat proxy.

use async_trait::async_trait;
use tracing::{debug, instrument};
use traits_core::{ChatMode, ChatReply, GroundingSource};
use traits_gemini::{
    ContentBuilder, Error as GeminiError, Gemini, GenerationResponse, HarmBlockThreshold,
    HarmCategory, Model, SafetySetting,
};

pub const MAX_OUTPUT_TOKENS: i32 = 8192;
pub const TOP_P: f32 = 1.0;
pub const TOP_K: i32 = 32;
pub const THINKING_BUDGET: i32 = 32768;

/// Generation settings for one chat mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeProfile {
    pub model: Model,
    pub temperature: f32,
    pub google_search: bool,
    pub thinking_budget: Option<i32>,
}

impl ModeProfile {
    pub fn for_mode(mode: ChatMode) -> Self {
        match mode {
            ChatMode::Standard => Self {
                model: Model::Gemini25Flash,
                temperature: 0.7,
                google_search: false,
                thinking_budget: None,
            },
            ChatMode::Grounded => Self {
                model: Model::Gemini25Flash,
                temperature: 0.7,
                google_search: true,
                thinking_budget: None,
            },
            ChatMode::Thinking => Self {
                model: Model::Gemini25Pro,
                temperature: 0.0,
                google_search: false,
                thinking_budget: Some(THINKING_BUDGET),
            },
        }
    }
}

/// Safety settings sent with every chat request.
pub fn safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::DangerousContent,
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
    ]
    .into_iter()
    .map(|category| SafetySetting::new(category, HarmBlockThreshold::BlockOnlyHigh))
    .collect()
}

/// Web citations of the first candidate that carry both a URI and a title.
pub fn extract_sources(response: &GenerationResponse) -> Vec<GroundingSource> {
    let Some(chunks) = response.grounding_metadata().and_then(|m| m.grounding_chunks.as_ref())
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| match (web.uri.as_deref(), web.title.as_deref()) {
            (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                Some(GroundingSource { uri: uri.to_string(), title: title.to_string() })
            }
            _ => None,
        })
        .collect()
}

/// Produces a chat reply for one prompt.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, prompt: &str, mode: ChatMode) -> Result<ChatReply, GeminiError>;
}

/// [`ChatBackend`] that forwards each prompt to Gemini in a single
/// `generateContent` call.
#[derive(Debug, Clone)]
pub struct GeminiChat {
    gemini: Gemini,
}

impl GeminiChat {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }

    /// The request that [`reply`](ChatBackend::reply) sends for `mode`.
    pub fn request(&self, prompt: &str, mode: ChatMode) -> ContentBuilder {
        let profile = ModeProfile::for_mode(mode);

        let mut builder = self
            .gemini
            .generate_content()
            .with_model(profile.model)
            .with_user_message(prompt)
            .with_max_output_tokens(MAX_OUTPUT_TOKENS)
            .with_temperature(profile.temperature)
            .with_top_p(TOP_P)
            .with_top_k(TOP_K)
            .with_safety_settings(safety_settings());

        if let Some(budget) = profile.thinking_budget {
            builder = builder.with_thinking_budget(budget);
        }
        if profile.google_search {
            builder = builder.with_google_search();
        }
        builder
    }
}

#[async_trait]
impl ChatBackend for GeminiChat {
    #[instrument(skip(self, prompt), fields(mode = %mode))]
    async fn reply(&self, prompt: &str, mode: ChatMode) -> Result<ChatReply, GeminiError> {
        let response = self.request(prompt, mode).execute().await?;
        let sources = extract_sources(&response);
        debug!(sources = sources.len(), "chat reply generated");
        Ok(ChatReply { text: response.text(), sources })
    }
}
