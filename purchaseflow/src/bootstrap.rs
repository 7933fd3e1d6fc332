//! Model download through the Ollama `/api/pull` endpoint.

use crate::errors::{BackendError, FailureKind};
use crate::llm::{error_for_status, OllamaBackend};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One progress line from a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgress {
    /// Status text, e.g. "pulling manifest".
    #[serde(default)]
    pub status: String,
    /// Total bytes for the current layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Bytes downloaded so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    /// Error reported mid-stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullProgress {
    /// Returns the completion percentage when both counters are known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0 => {
                Some(completed as f64 / total as f64 * 100.0)
            }
            _ => None,
        }
    }

    /// Renders the line as `"<status>: <pct>%"`, or the bare status.
    #[must_use]
    pub fn render(&self) -> String {
        match self.percent() {
            Some(pct) => format!("{}: {pct:.2}%", self.status),
            None => self.status.clone(),
        }
    }
}

#[derive(Serialize)]
struct PullBody<'a> {
    name: &'a str,
    stream: bool,
}

/// Downloads models onto an Ollama server.
#[derive(Debug, Clone)]
pub struct ModelPuller {
    backend: OllamaBackend,
}

impl ModelPuller {
    /// Creates a puller sharing the backend's client and address.
    #[must_use]
    pub fn new(backend: OllamaBackend) -> Self {
        Self { backend }
    }

    /// Pulls `model`, calling `on_progress` for every status line.
    ///
    /// Returns the last status reported by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, answers with a
    /// non-success status, sends malformed progress, or reports an error
    /// mid-stream.
    pub async fn pull<F>(&self, model: &str, mut on_progress: F) -> Result<String, BackendError>
    where
        F: FnMut(&PullProgress),
    {
        info!(model = %model, url = %self.backend.base_url(), "pulling model");
        let mut response = self
            .backend
            .client()
            .post(self.backend.endpoint("api/pull"))
            .json(&PullBody { name: model, stream: true })
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;
        response = error_for_status(response).await?;

        let mut buffer: Vec<u8> = Vec::new();
        let mut last_status = String::new();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BackendError::from_transport(&e))?
        {
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(progress) = parse_line(&line)? {
                    last_status = handle(progress, &mut on_progress)?;
                }
            }
        }
        if let Some(progress) = parse_line(&buffer)? {
            last_status = handle(progress, &mut on_progress)?;
        }

        info!(model = %model, status = %last_status, "pull finished");
        Ok(last_status)
    }
}

fn parse_line(line: &[u8]) -> Result<Option<PullProgress>, BackendError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some).map_err(|e| {
        BackendError::new(FailureKind::Other, format!("malformed pull progress: {e}"))
    })
}

fn handle<F>(progress: PullProgress, on_progress: &mut F) -> Result<String, BackendError>
where
    F: FnMut(&PullProgress),
{
    if let Some(error) = progress.error {
        return Err(BackendError::from_message(error));
    }
    debug!(status = %progress.status, "pull progress");
    on_progress(&progress);
    Ok(progress.status)
}
