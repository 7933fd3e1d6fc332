//! Chat backends for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{BackendError, FailureKind};
use crate::llm::{ChatBackend, ChatRequest};

type Responder = Box<dyn Fn(usize, &str) -> Result<String, BackendError> + Send + Sync>;

/// A backend that answers from a script and records every request.
pub struct ScriptedBackend {
    responder: Responder,
    requests: Mutex<Vec<ChatRequest>>,
}

impl fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl ScriptedBackend {
    /// Creates a backend driven by a closure of (call index, prompt).
    #[must_use]
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(usize, &str) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same text.
    #[must_use]
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_, _| Ok(text.clone()))
    }

    /// Answers with each reply in turn, repeating the last one.
    #[must_use]
    pub fn sequence<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        Self::with_responder(move |index, _| {
            replies
                .get(index)
                .or_else(|| replies.last())
                .cloned()
                .ok_or_else(|| BackendError::new(FailureKind::Other, "script is empty"))
        })
    }

    /// Answers with the prompt itself.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_responder(|_, prompt| Ok(prompt.to_string()))
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Returns the prompt of every request received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.prompt().to_string())
            .collect()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let index = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.responder)(index, request.prompt())
    }
}

/// A backend whose every call fails with the same error.
#[derive(Debug)]
pub struct UnreachableBackend {
    error: BackendError,
    calls: AtomicUsize,
}

impl UnreachableBackend {
    /// Fails with the given error.
    #[must_use]
    pub fn new(error: BackendError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Nothing listening at the backend address.
    #[must_use]
    pub fn connection_refused() -> Self {
        Self::new(BackendError::new(
            FailureKind::ConnectionRefused,
            "error sending request: Connection refused (os error 111)",
        ))
    }

    /// The server answers 404 for the model.
    #[must_use]
    pub fn model_not_found(model: &str) -> Self {
        Self::new(BackendError::from_status(
            404,
            &format!("model '{model}' not found"),
        ))
    }

    /// The request never completes.
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(BackendError::new(FailureKind::Timeout, "operation timed out"))
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for UnreachableBackend {
    async fn chat(&self, _request: &ChatRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
