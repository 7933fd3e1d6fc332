//! Ollama HTTP backend.

use super::{ChatBackend, ChatMessage, ChatRequest};
use crate::config::AdvisorConfig;
use crate::errors::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A [`ChatBackend`] for the Ollama `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

#[derive(Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaBackend {
    /// Creates a backend with a default HTTP client.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a backend around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a backend from configuration, applying the request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::from_transport(&e))?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Builds a full URL for an API path such as `api/chat`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Lists the models installed on the server (`GET /api/tags`).
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or answers with a
    /// non-success status.
    pub async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.endpoint("api/tags"))
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        let response = error_for_status(response).await?;
        let tags: TagsReply = response
            .json()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Turns a non-success response into a [`BackendError`] carrying the
/// server's own error text when it sent one.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorReply>(&body)
        .map(|reply| reply.error)
        .unwrap_or(body);
    Err(BackendError::from_status(status.as_u16(), &detail))
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let body = ChatBody {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
            },
        };

        debug!(model = %request.model, url = %self.base_url, "sending chat request");
        let response = self
            .client
            .post(self.endpoint("api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        let response = error_for_status(response).await?;

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        Ok(reply.message.content)
    }
}
