//! Chat transcript and the chat dispatcher.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;
use traits_core::{ChatMode, ChatRequest, GroundingSource};
use uuid::Uuid;

use crate::backend::TraitsBackend;
use crate::loading::LoadingFlag;

pub const WELCOME_ID: &str = "initial-welcome";

pub const WELCOME_TEXT: &str = "### Welcome to the Traits Assistant!\n\n\
You can ask me questions about:\n\
- Species traits found in our databases.\n\
- Statistical patterns in the trait data.\n\
- Use **Grounded Search** to find up-to-date information.\n\
- Use **Deep Analysis** for complex queries and to expand on existing data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ChatMode>,
}

impl ChatMessage {
    pub fn welcome() -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            sender: Sender::Bot,
            text: WELCOME_TEXT.to_string(),
            sources: None,
            mode: Some(ChatMode::Standard),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::User,
            text: text.into(),
            sources: None,
            mode: None,
        }
    }

    /// A bot reply; empty source lists are dropped.
    pub fn bot(text: impl Into<String>, sources: Vec<GroundingSource>, mode: ChatMode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::Bot,
            text: text.into(),
            sources: (!sources.is_empty()).then_some(sources),
            mode: Some(mode),
        }
    }
}

/// Append-only transcript plus the selected mode and the loading flag.
pub struct ChatSession {
    backend: Arc<dyn TraitsBackend>,
    messages: Mutex<Vec<ChatMessage>>,
    mode: Mutex<ChatMode>,
    loading: LoadingFlag,
}

impl ChatSession {
    /// A fresh session holding only the welcome message.
    pub fn new(backend: Arc<dyn TraitsBackend>) -> Self {
        Self {
            backend,
            messages: Mutex::new(vec![ChatMessage::welcome()]),
            mode: Mutex::new(ChatMode::Standard),
            loading: LoadingFlag::default(),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn mode(&self) -> ChatMode {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: ChatMode) {
        *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_set()
    }

    /// Clears the transcript back to the welcome message and selects
    /// [`ChatMode::Standard`].
    pub fn reset(&self) {
        *self.messages.lock().unwrap_or_else(PoisonError::into_inner) = vec![ChatMessage::welcome()];
        self.set_mode(ChatMode::Standard);
    }

    /// Sends `prompt` in the currently selected mode.
    pub async fn send(&self, prompt: &str) -> Option<ChatMessage> {
        self.send_message(prompt, self.mode()).await
    }

    /// Appends the user turn, asks the backend, and appends the reply.
    ///
    /// Returns `None` without touching the transcript for a blank prompt or
    /// while another message is in flight. Backend failures become a bot
    /// message rather than an error.
    pub async fn send_message(&self, prompt: &str, mode: ChatMode) -> Option<ChatMessage> {
        if prompt.trim().is_empty() {
            return None;
        }
        let Some(_loading) = self.loading.try_begin() else {
            return None;
        };

        self.push(ChatMessage::user(prompt));

        let reply = match self.backend.chat(&ChatRequest::new(prompt, mode)).await {
            Ok(reply) => ChatMessage::bot(reply.text, reply.sources, mode),
            Err(err) => {
                warn!(%mode, error = %err, "chat request failed");
                ChatMessage::bot(format!("Sorry, I encountered an error. {err}"), Vec::new(), mode)
            }
        };

        self.push(reply.clone());
        Some(reply)
    }

    fn push(&self, message: ChatMessage) {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn welcome_message_shape() {
        let welcome = ChatMessage::welcome();
        assert_eq!(welcome.id, "initial-welcome");
        assert_eq!(welcome.sender, Sender::Bot);
        assert_eq!(welcome.mode, Some(ChatMode::Standard));
        assert!(welcome.text.starts_with("### Welcome to the Traits Assistant!"));
        assert!(welcome.text.contains("**Deep Analysis**"));
    }

    #[test]
    fn bot_message_drops_empty_sources() {
        let message = ChatMessage::bot("hi", Vec::new(), ChatMode::Grounded);
        assert_eq!(message.sources, None);
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"id": message.id, "sender": "bot", "text": "hi", "mode": "grounded"})
        );
    }

    #[test]
    fn messages_get_distinct_ids() {
        assert_ne!(ChatMessage::user("a").id, ChatMessage::user("a").id);
    }
}
