//! Client side of the traits assistant.
//!
//! The session types own all client state: [`SearchSession`] holds the one
//! active [`SearchResult`], [`ChatSession`] the append-only transcript. Both
//! reach the backend through a [`TraitsBackend`], normally [`HttpBackend`].
//! [`render`] turns that state into terminal lines.

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
mod loading;
pub mod render;
pub mod search;

pub use backend::{Datasets, HttpBackend, TraitsBackend, fetch_datasets};
pub use chat::{ChatMessage, ChatSession, Sender, WELCOME_ID, WELCOME_TEXT};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use search::{Busy, SearchQuery, SearchResult, SearchSession, SpeciesOptions};
