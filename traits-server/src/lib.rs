//! `traits-server` is the HTTP backend of the traits assistant.
//!
//! It exposes three endpoints: exact-match trait lookups against the
//! document store (`POST /api/search`), a stateless Gemini chat proxy
//! (`POST /api/chat`), and streaming of the pre-built datasets
//! (`GET /api/data/{type}`).

pub mod chat;
pub mod config;
pub mod error;
pub mod server;

pub use chat::{ChatBackend, GeminiChat, ModeProfile, extract_sources, safety_settings};
pub use config::{ConfigError, ServerConfig};
pub use error::{ChatError, DataError, SearchError};
pub use server::{AppState, app_router, run_server};
