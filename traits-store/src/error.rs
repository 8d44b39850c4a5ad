//! Error types for the `traits-store` crate.

use thiserror::Error;

/// Errors that can occur while reading from a store or dataset backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or answered with an error.
    #[error("Store backend error ({backend}): {message}")]
    Backend {
        /// The backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The backend answered, but its payload could not be understood.
    #[error("Decode error ({backend}): {message}")]
    Decode {
        /// The backend that produced the payload.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn backend(backend: &str, message: impl Into<String>) -> Self {
        Self::Backend { backend: backend.to_string(), message: message.into() }
    }

    pub(crate) fn decode(backend: &str, message: impl Into<String>) -> Self {
        Self::Decode { backend: backend.to_string(), message: message.into() }
    }
}

/// A convenience result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
