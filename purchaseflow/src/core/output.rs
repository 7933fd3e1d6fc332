//! Stage output and run report types.

use super::StageStatus;
use crate::llm::InvocationResult;
use crate::state::{OutputField, StateUpdate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The output of one stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// The stage that produced the output.
    pub stage: String,
    /// The field the output is written to.
    pub field: OutputField,
    /// Whether the text is genuine or a fallback.
    pub status: StageStatus,
    /// The complete text.
    pub content: String,
    /// Length of the prompt sent to the backend, in bytes.
    pub prompt_len: usize,
    /// Time spent in the stage, in milliseconds.
    pub duration_ms: f64,
}

impl StageOutput {
    /// Creates a stage output from an invocation result.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        field: OutputField,
        result: InvocationResult,
        prompt_len: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            stage: stage.into(),
            field,
            status: StageStatus::from_degraded(result.degraded),
            content: result.content,
            prompt_len,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Returns true if the content is fallback text.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status.is_degraded()
    }

    /// Returns the state update this output represents.
    #[must_use]
    pub fn to_update(&self) -> StateUpdate {
        StateUpdate::new(self.field, self.content.clone())
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of the run.
    pub run_id: String,
    /// Name of the pipeline that ran.
    pub pipeline: String,
    /// When the run started (ISO 8601).
    pub started_at: String,
    /// Total run time in milliseconds.
    pub duration_ms: f64,
    /// Per-stage outputs, in execution order.
    pub stages: Vec<StageOutput>,
}

impl RunReport {
    /// Returns true if any stage fell back to mock output.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.stages.iter().any(StageOutput::is_degraded)
    }

    /// Returns the names of degraded stages.
    #[must_use]
    pub fn degraded_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.is_degraded())
            .map(|s| s.stage.as_str())
            .collect()
    }

    /// Returns the output of a named stage.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageOutput> {
        self.stages.iter().find(|s| s.stage == name)
    }
}
