//! Shared types for the traits assistant.
//!
//! The backend, the document store, and the client all speak in terms of the
//! types defined here: the opaque [`TraitRecord`] returned by lookups, the JSON
//! bodies exchanged over `/api/search` and `/api/chat`, and the keys of the
//! static datasets served from `/api/data/{type}`.

pub mod dataset;
pub mod record;
pub mod wire;

pub use dataset::DatasetKind;
pub use record::TraitRecord;
pub use wire::{
    ChatMode, ChatReply, ChatRequest, GroundingSource, MessageBody, SearchKind, SearchRequest,
};
