//! Error types for the purchaseflow pipeline.
//!
//! Only input validation, pipeline construction and internal invariant
//! violations ever reach a caller of the advisor. Backend failures are
//! modelled here too, but the resilient invoker absorbs them before they
//! can leave a stage.

use crate::state::{Field, OutputField};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for purchaseflow operations.
#[derive(Debug, Error)]
pub enum PurchaseflowError {
    /// The purchase request is missing required input.
    #[error("{0}")]
    InvalidInput(#[from] InputValidationError),

    /// The stage chain is malformed.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage read a field outside its read-set.
    #[error("{0}")]
    StateRead(#[from] StateReadError),

    /// A stage tried to overwrite an output field.
    #[error("{0}")]
    OutputConflict(#[from] OutputConflictError),

    /// The configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A backend call failed outside the resilient invoker (bootstrap, checks).
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONTRACT-READ-ORDER").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Error raised when a purchase request fails validation.
///
/// Raised before the pipeline starts, so no backend call has been made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fill in at least the Product and Budget fields (missing: {})", join_fields(.missing))]
pub struct InputValidationError {
    /// The required fields that were empty.
    pub missing: Vec<Field>,
}

impl InputValidationError {
    /// Creates a new input validation error.
    #[must_use]
    pub fn new(missing: Vec<Field>) -> Self {
        Self { missing }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised when building a stage chain fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a stage reads state it is not entitled to see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateReadError {
    /// The field is not part of the stage's declared read-set.
    #[error("Undeclared read: stage '{stage}' attempted to read '{field}' which was not declared")]
    Undeclared {
        /// The reading stage.
        stage: String,
        /// The field it tried to read.
        field: Field,
    },

    /// The field is declared but its owning stage has not run yet.
    #[error("Stage '{stage}' read '{field}' before it was written")]
    NotYetWritten {
        /// The reading stage.
        stage: String,
        /// The unwritten field.
        field: Field,
    },
}

/// Error raised when an output field would be written twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Output conflict: '{field}' has already been written")]
pub struct OutputConflictError {
    /// The field that was already populated.
    pub field: OutputField,
}

impl OutputConflictError {
    /// Creates a new output conflict error.
    #[must_use]
    pub fn new(field: OutputField) -> Self {
        Self { field }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// The configuration key or variable name.
        key: String,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The assembled configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Broad classes of backend failure, used to pick a remediation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend is reachable but the named model is absent.
    ModelNotFound,
    /// Nothing is listening at the backend address.
    ConnectionRefused,
    /// The request did not complete in time.
    Timeout,
    /// Any other transport or protocol failure.
    Other,
}

impl FailureKind {
    /// Classifies free-form error text.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("404") || lower.contains("not found") {
            Self::ModelNotFound
        } else if lower.contains("refused") {
            Self::ConnectionRefused
        } else if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelNotFound => write!(f, "model_not_found"),
            Self::ConnectionRefused => write!(f, "connection_refused"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A failed call to the text-generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// The failure class.
    pub kind: FailureKind,
    /// Descriptive error text.
    pub message: String,
    /// HTTP status code, when the backend answered at all.
    pub status: Option<u16>,
}

impl BackendError {
    /// Creates a backend error of a known kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Creates a backend error, classifying it from its text.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(FailureKind::classify(&message), message)
    }

    /// Creates a backend error from a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("{} (status code: {status})", body.trim());
        let kind = if status == 404 {
            FailureKind::ModelNotFound
        } else {
            FailureKind::classify(&message)
        };
        Self {
            kind,
            message,
            status: Some(status),
        }
    }

    /// Creates a backend error from a transport failure.
    ///
    /// The full source chain goes into the message, since reqwest keeps the
    /// interesting part ("Connection refused") in the innermost error. Only
    /// the source chain is classified; the top-level text carries the request
    /// URL, whose host or port may contain "404".
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let mut detail = String::new();
        let mut source = std::error::Error::source(err);
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }

        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else {
            match FailureKind::classify(&detail) {
                FailureKind::ModelNotFound if err.is_connect() => FailureKind::ConnectionRefused,
                kind => kind,
            }
        };
        Self {
            kind,
            message: format!("{err}{detail}"),
            status: err.status().map(|s| s.as_u16()),
        }
    }

    /// The backend answered successfully but with no text.
    #[must_use]
    pub fn empty_response() -> Self {
        Self::new(FailureKind::Other, "backend returned an empty response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.summary, "Test error");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
    }

    #[test]
    fn test_input_validation_error_lists_fields() {
        let err = InputValidationError::new(vec![Field::Product, Field::Budget]);
        let msg = err.to_string();

        assert!(msg.starts_with("Please fill in at least the Product and Budget fields"));
        assert!(msg.contains("product, budget"));
    }

    #[test]
    fn test_pipeline_validation_error_code() {
        let err = PipelineValidationError::new("bad")
            .with_stages(vec!["a".to_string()])
            .with_error_info(ContractErrorInfo::new("CONTRACT-EMPTY", "empty"));

        assert_eq!(err.code(), Some("CONTRACT-EMPTY"));
        assert_eq!(err.stages, vec!["a".to_string()]);
    }

    #[test]
    fn test_failure_kind_classify() {
        assert_eq!(
            FailureKind::classify("model \"llama3\" not found, try pulling it first"),
            FailureKind::ModelNotFound
        );
        assert_eq!(FailureKind::classify("404 page"), FailureKind::ModelNotFound);
        assert_eq!(
            FailureKind::classify("tcp connect error: Connection refused (os error 111)"),
            FailureKind::ConnectionRefused
        );
        assert_eq!(FailureKind::classify("operation timed out"), FailureKind::Timeout);
        assert_eq!(FailureKind::classify("bad gateway"), FailureKind::Other);
    }

    #[test]
    fn test_backend_error_from_status() {
        let err = BackendError::from_status(404, "model 'x' missing");
        assert_eq!(err.kind, FailureKind::ModelNotFound);
        assert_eq!(err.status, Some(404));
        assert!(err.message.contains("status code: 404"));

        let err = BackendError::from_status(500, "boom");
        assert_eq!(err.kind, FailureKind::Other);
    }

    #[test]
    fn test_state_read_error_display() {
        let err = StateReadError::Undeclared {
            stage: "budget".to_string(),
            field: Field::Preferences,
        };
        assert!(err.to_string().contains("'preferences'"));
    }

    #[test]
    fn test_output_conflict_display() {
        let err = OutputConflictError::new(OutputField::Alternatives);
        assert_eq!(err.to_string(), "Output conflict: 'alternatives' has already been written");
    }
}
