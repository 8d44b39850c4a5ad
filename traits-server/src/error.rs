//! Endpoint error types and their HTTP representations.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use traits_core::{ChatReply, MessageBody};
use traits_store::StoreError;

/// Errors of the lookup endpoint; rendered as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    BadRequest(String),

    #[error("No document found for '{0}'")]
    NotFound(String),

    #[error("Failed to query the trait database")]
    Store(#[source] StoreError),
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageBody::new(self.to_string()))).into_response()
    }
}

/// Errors of the chat endpoint; rendered as a [`ChatReply`] without sources.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("An error occurred while processing your request: {0}")]
    Model(String),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            ChatError::EmptyPrompt => StatusCode::BAD_REQUEST,
            ChatError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ChatReply::text_only(self.to_string()))).into_response()
    }
}

/// Errors of the dataset endpoint; rendered as plain text.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data type not found")]
    UnknownType(String),

    #[error("Failed to fetch data from storage")]
    Storage(#[source] StoreError),
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let status = match self {
            DataError::UnknownType(_) => StatusCode::NOT_FOUND,
            DataError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_map_to_status_and_message() {
        let not_found = SearchError::NotFound("zzzz".into());
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "No document found for 'zzzz'");

        let store = SearchError::Store(StoreError::Config("boom".into()));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.to_string(), "Failed to query the trait database");
    }

    #[test]
    fn chat_error_text_embeds_model_error() {
        let err = ChatError::Model("quota exceeded".into());
        assert_eq!(
            err.to_string(),
            "An error occurred while processing your request: quota exceeded"
        );
    }
}
