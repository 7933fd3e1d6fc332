//! Text-generation backend access.
//!
//! - [`ChatBackend`] is the seam to the external model service
//! - [`OllamaBackend`] talks to a local Ollama server over HTTP
//! - [`ResilientInvoker`] wraps any backend and never fails, substituting
//!   topic-matched fallback text from [`fallback`] when the backend does

pub mod fallback;
mod invoker;
mod ollama;

pub use fallback::Topic;
pub use invoker::{InvocationResult, ResilientInvoker};
pub use ollama::OllamaBackend;
pub(crate) use ollama::error_for_status;

use crate::errors::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A request for one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ChatRequest {
    /// Creates a request carrying a single user message.
    #[must_use]
    pub fn single_user(model: impl Into<String>, temperature: f32, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        }
    }

    /// Returns the text of the first message.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.messages.first().map_or("", |m| m.content.as_str())
    }
}

/// A text-generation service.
///
/// Implementations report every failure as a [`BackendError`]; turning
/// failures into usable output is the invoker's job, not the backend's.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a request and returns the generated text.
    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_user_request() {
        let request = ChatRequest::single_user("llama3.2:1b", 0.7, "hello");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.prompt(), "hello");
    }

    #[test]
    fn test_role_serialize() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
