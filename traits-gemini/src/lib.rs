//! A small Gemini REST client.
//!
//! Only the surface the traits assistant needs is covered: a single,
//! non-streaming `generateContent` call with generation config, safety
//! settings, the Google Search tool, and thinking budgets, plus typed
//! responses including grounding metadata.
//!
//! ```no_run
//! use traits_gemini::{Gemini, Model};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gemini = Gemini::with_model("YOUR_API_KEY", Model::Gemini25Flash)?;
//! let response = gemini
//!     .generate_content()
//!     .with_user_message("Which big cats live in savannas?")
//!     .with_temperature(0.7)
//!     .with_google_search()
//!     .execute()
//!     .await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod generation;
pub mod safety;
pub mod tools;


pub use client::{Error, Gemini, GeminiBuilder, Model};
pub use generation::{
    BlockReason, Candidate, Content, ContentBuilder, FinishReason, GenerateContentRequest,
    GenerationConfig, GenerationResponse, GroundingChunk, GroundingMetadata, GroundingSupport,
    Part, PromptFeedback, Role, Segment, ThinkingConfig, UsageMetadata, WebGroundingChunk,
};
pub use safety::{HarmBlockThreshold, HarmCategory, HarmProbability, SafetyRating, SafetySetting};
pub use tools::{GoogleSearch, Tool};
