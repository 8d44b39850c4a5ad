//! Tools that can be attached to a generation request.

use serde::{Deserialize, Serialize};

/// Marker object for the built-in Google Search retrieval tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearch {}

/// A tool entry in `GenerateContentRequest::tools`.
///
/// Each entry carries exactly one tool kind; the API rejects entries that
/// set none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    GoogleSearch(GoogleSearch),
}

impl Tool {
    pub fn google_search() -> Self {
        Tool::GoogleSearch(GoogleSearch::default())
    }
}
