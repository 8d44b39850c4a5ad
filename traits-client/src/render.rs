//! Plain-text rendering of results, the chat transcript, and the header.

use serde_json::Value;
use traits_core::TraitRecord;

use crate::chat::{ChatMessage, Sender};
use crate::search::SearchResult;

/// Headline figures shown above the search forms.
pub const STAT_CARDS: [(&str, &str); 3] = [
    ("Traits with Vernacular or Scientific names", "2,171,126"),
    ("Traits with Vernacular and Scientific names", "1,908,769"),
    ("Phylogenetic Tree Levels with Traits", "58,849"),
];

pub const ATTRIBUTION: &str = "All the data used in this application has been extracted from the \
Encyclopedia of Life (https://naturalhistory.si.edu/research/eol)";

/// A rendered search result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub title: Option<String>,
    pub lines: Vec<String>,
    pub is_error: bool,
}

impl ResultCard {
    pub fn to_lines(&self) -> Vec<String> {
        self.title.iter().cloned().chain(self.lines.iter().cloned()).collect()
    }
}

/// Field names are shown with underscores as spaces.
pub fn display_key(key: &str) -> String {
    key.replace('_', " ")
}

/// Lists are joined with `", "`; strings are shown without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

pub fn record_lines(record: &TraitRecord) -> Vec<String> {
    record.iter().map(|(key, value)| format!("{}: {}", display_key(key), display_value(value))).collect()
}

pub fn render_result(result: &SearchResult) -> ResultCard {
    match result {
        SearchResult::Species { query, data } | SearchResult::Phylo { query, data } => ResultCard {
            title: Some(format!("Results for \"{query}\"")),
            lines: record_lines(data),
            is_error: false,
        },
        SearchResult::NotFound(message) | SearchResult::Info(message) => {
            ResultCard { title: None, lines: vec![message.clone()], is_error: false }
        }
        SearchResult::Error(message) => {
            ResultCard { title: None, lines: vec![message.clone()], is_error: true }
        }
    }
}

pub fn render_message(message: &ChatMessage) -> Vec<String> {
    let label = match (message.sender, message.mode) {
        (Sender::User, _) => "You".to_string(),
        (Sender::Bot, Some(mode)) => format!("Assistant [{}]", mode.label()),
        (Sender::Bot, None) => "Assistant".to_string(),
    };

    let mut lines = vec![format!("{label}:")];
    lines.extend(message.text.lines().map(str::to_string));
    if let Some(sources) = &message.sources {
        lines.push("Sources:".to_string());
        lines.extend(sources.iter().map(|source| format!("  - {} <{}>", source.title, source.uri)));
    }
    lines
}

pub fn render_transcript(messages: &[ChatMessage]) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.extend(render_message(message));
    }
    lines
}

pub fn header_lines() -> Vec<String> {
    let mut lines = vec!["Traits Search & Patterns Analysis".to_string(), String::new()];
    lines.extend(STAT_CARDS.iter().map(|(title, value)| format!("{value:>10}  {title}")));
    lines.push(String::new());
    lines.push(ATTRIBUTION.to_string());
    lines
}
