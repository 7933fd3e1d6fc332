//! Lifecycle events emitted while a pipeline runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event emitted during pipeline execution.
///
/// Events are consumed by an [`EventSink`](crate::events::EventSink) for
/// logging or test assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The event type (e.g., "stage.started", "stage.degraded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StageEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns a string data field.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }

    /// Creates a "pipeline.started" event.
    #[must_use]
    pub fn pipeline_started(pipeline: &str, run_id: &str) -> Self {
        Self::new("pipeline.started")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("run_id", serde_json::json!(run_id))
    }

    /// Creates a "pipeline.completed" event.
    #[must_use]
    pub fn pipeline_completed(pipeline: &str, run_id: &str, degraded_stages: usize, duration_ms: f64) -> Self {
        Self::new("pipeline.completed")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("degraded_stages", serde_json::json!(degraded_stages))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn stage_started(stage: &str) -> Self {
        Self::new("stage.started").add_data("stage", serde_json::json!(stage))
    }

    /// Creates a "stage.completed" event.
    #[must_use]
    pub fn stage_completed(stage: &str, field: &str, duration_ms: f64) -> Self {
        Self::new("stage.completed")
            .add_data("stage", serde_json::json!(stage))
            .add_data("field", serde_json::json!(field))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.degraded" event.
    #[must_use]
    pub fn stage_degraded(stage: &str, field: &str) -> Self {
        Self::new("stage.degraded")
            .add_data("stage", serde_json::json!(stage))
            .add_data("field", serde_json::json!(field))
    }
}
