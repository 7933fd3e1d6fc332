//! The resilient invoker.

use super::fallback::{self, Topic};
use super::{ChatBackend, ChatRequest};
use crate::config::AdvisorConfig;
use crate::errors::BackendError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// The text produced by one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Model output, or fallback text when `degraded` is set.
    pub content: String,
    /// Whether the content was synthesized after a backend failure.
    #[serde(default)]
    pub degraded: bool,
}

impl InvocationResult {
    /// A genuine model response.
    #[must_use]
    pub fn genuine(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            degraded: false,
        }
    }

    /// A synthesized stand-in response.
    #[must_use]
    pub fn degraded(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            degraded: true,
        }
    }
}

/// Generates text from a prompt and never fails.
///
/// Backend errors are logged and replaced with fallback text chosen by
/// topic. Once any call has degraded, [`is_mock`](Self::is_mock) stays true
/// for the lifetime of the invoker.
pub struct ResilientInvoker {
    backend: Arc<dyn ChatBackend>,
    model: String,
    temperature: f32,
    mock_mode: AtomicBool,
}

impl fmt::Debug for ResilientInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("mock_mode", &self.is_mock())
            .finish_non_exhaustive()
    }
}

impl ResilientInvoker {
    /// Creates a new invoker.
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature,
            mock_mode: AtomicBool::new(false),
        }
    }

    /// Creates an invoker using the model and temperature from a config.
    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &AdvisorConfig) -> Self {
        Self::new(backend, config.model.clone(), config.temperature)
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if any call so far has fallen back to mock output.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.mock_mode.load(Ordering::SeqCst)
    }

    /// Invokes the backend, choosing fallback text from the prompt wording.
    pub async fn invoke(&self, prompt: &str) -> InvocationResult {
        self.invoke_with_topic(Topic::detect(prompt), prompt).await
    }

    /// Invokes the backend on behalf of a stage with a known topic.
    pub async fn invoke_for(&self, topic: Topic, prompt: &str) -> InvocationResult {
        self.invoke_with_topic(Some(topic), prompt).await
    }

    async fn invoke_with_topic(&self, topic: Option<Topic>, prompt: &str) -> InvocationResult {
        let request = ChatRequest::single_user(&self.model, self.temperature, prompt);

        let outcome = match self.backend.chat(&request).await {
            Ok(content) if content.trim().is_empty() => Err(BackendError::empty_response()),
            other => other,
        };

        match outcome {
            Ok(content) => {
                debug!(model = %self.model, chars = content.len(), "backend responded");
                InvocationResult::genuine(content)
            }
            Err(err) => {
                warn!(
                    model = %self.model,
                    kind = %err.kind,
                    error = %err,
                    topic = ?topic,
                    "backend call failed, switching to mock mode"
                );
                self.mock_mode.store(true, Ordering::SeqCst);
                InvocationResult::degraded(fallback::fallback_content(topic, &err, &self.model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::llm::MockChatBackend;

    fn invoker(mock: MockChatBackend) -> ResilientInvoker {
        ResilientInvoker::new(Arc::new(mock), "llama3.2:1b", 0.7)
    }

    #[tokio::test]
    async fn test_success_passes_content_through() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .withf(|req| {
                req.model == "llama3.2:1b"
                    && (req.temperature - 0.7).abs() < f32::EPSILON
                    && req.messages.len() == 1
                    && req.prompt() == "Is a budget of $5 enough?"
            })
            .times(1)
            .returning(|_| Ok("Probably not.".to_string()));

        let invoker = invoker(mock);
        let result = invoker.invoke("Is a budget of $5 enough?").await;

        assert_eq!(result, InvocationResult::genuine("Probably not."));
        assert!(!invoker.is_mock());
    }

    #[tokio::test]
    async fn test_refused_connection_degrades() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat().returning(|_| {
            Err(BackendError::new(
                FailureKind::ConnectionRefused,
                "error sending request: Connection refused",
            ))
        });

        let invoker = invoker(mock);
        let result = invoker.invoke("Analyze if this is a NECESSITY").await;

        assert!(result.degraded);
        assert!(result.content.contains("**Mock Analysis**"));
        assert!(result.content.contains("Run `ollama serve`"));
        assert!(invoker.is_mock());
    }

    #[tokio::test]
    async fn test_missing_model_hint_names_model() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .returning(|_| Err(BackendError::from_status(404, "model not found")));

        let result = invoker(mock).invoke_for(Topic::Quality, "anything").await;

        assert!(result.content.contains("**Mock Quality**"));
        assert!(result.content.contains("ollama pull llama3.2:1b"));
    }

    #[tokio::test]
    async fn test_stage_topic_overrides_prompt_keywords() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .returning(|_| Err(BackendError::from_message("boom")));

        let result = invoker(mock)
            .invoke_for(Topic::Recommendation, "Necessity: ... Budget Check: ...")
            .await;

        assert!(result.content.contains("**Mock Verdict**"));
        assert!(!result.content.contains("**Mock Analysis**"));
    }

    #[tokio::test]
    async fn test_unknown_topic_uses_generic_text() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .returning(|_| Err(BackendError::from_message("bad gateway")));

        let result = invoker(mock).invoke("Hello, are you there?").await;

        assert!(result.degraded);
        assert!(result.content.contains("(System Error): bad gateway"));
        assert!(result.content.contains("Please check if Ollama is running."));
    }

    #[tokio::test]
    async fn test_empty_response_degrades() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat().returning(|_| Ok("   ".to_string()));

        let result = invoker(mock).invoke_for(Topic::Budget, "budget?").await;

        assert!(result.degraded);
        assert!(result.content.contains("**Mock Budget**"));
    }

    #[tokio::test]
    async fn test_fallback_selection_is_repeatable() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .times(2)
            .returning(|_| Err(BackendError::from_message("connection refused")));

        let invoker = invoker(mock);
        let prompt = "Suggest 2 alternatives";
        let first = invoker.invoke(prompt).await;
        let second = invoker.invoke(prompt).await;

        assert_eq!(first, second);
        assert!(first.content.contains("**Mock Alternatives**"));
    }
}
