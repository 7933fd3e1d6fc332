//! Stage trait and the prompt-stage descriptor.
//!
//! A stage reads a few fields of the pipeline state, builds one prompt,
//! calls the invoker once and hands back a single-field update.

mod advisor;

pub use advisor::{
    advisor_stages, alternatives_stage, budget_stage, finalize_stage, necessity_stage,
    quality_stage,
};

use crate::core::StageOutput;
use crate::errors::StateReadError;
use crate::llm::{ResilientInvoker, Topic};
use crate::state::{Field, OutputField, StateView};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Instant;
use tracing::debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Topic used to pick fallback text if the backend fails.
    fn topic(&self) -> Topic;

    /// Fields the stage may read.
    fn reads(&self) -> &[Field];

    /// The one field the stage writes.
    fn writes(&self) -> OutputField;

    /// Builds the prompt from the stage's view of the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder reads outside the view.
    fn build_prompt(&self, view: &StateView<'_>) -> Result<String, StateReadError>;

    /// Executes the stage: one prompt, one invocation.
    ///
    /// Backend failures never surface here; they come back as degraded
    /// output. Only a read outside the stage's view is an error.
    async fn execute(
        &self,
        view: StateView<'_>,
        invoker: &ResilientInvoker,
    ) -> Result<StageOutput, StateReadError> {
        let started = Instant::now();
        let prompt = self.build_prompt(&view)?;
        debug!(stage = %self.name(), prompt_len = prompt.len(), "invoking backend");

        let result = invoker.invoke_for(self.topic(), &prompt).await;
        Ok(StageOutput::new(
            self.name(),
            self.writes(),
            result,
            prompt.len(),
            started.elapsed(),
        ))
    }
}

/// Builds a prompt from a state view.
pub type PromptBuilder = fn(&StateView<'_>) -> Result<String, StateReadError>;

/// A stage described entirely by data: name, topic, read-set, write field
/// and prompt builder.
#[derive(Clone)]
pub struct PromptStage {
    name: String,
    topic: Topic,
    reads: Vec<Field>,
    writes: OutputField,
    builder: PromptBuilder,
}

impl PromptStage {
    /// Creates a new prompt stage.
    pub fn new(
        name: impl Into<String>,
        topic: Topic,
        reads: impl IntoIterator<Item = Field>,
        writes: OutputField,
        builder: PromptBuilder,
    ) -> Self {
        Self {
            name: name.into(),
            topic,
            reads: reads.into_iter().collect(),
            writes,
            builder,
        }
    }
}

impl Debug for PromptStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStage")
            .field("name", &self.name)
            .field("topic", &self.topic)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for PromptStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn topic(&self) -> Topic {
        self.topic
    }

    fn reads(&self) -> &[Field] {
        &self.reads
    }

    fn writes(&self) -> OutputField {
        self.writes
    }

    fn build_prompt(&self, view: &StateView<'_>) -> Result<String, StateReadError> {
        (self.builder)(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::state::{PipelineState, PurchaseRequest};
    use crate::testing::{ScriptedBackend, UnreachableBackend};
    use std::sync::Arc;

    fn echo_product(view: &StateView<'_>) -> Result<String, StateReadError> {
        Ok(format!("budget for {}", view.get(Field::Product)?))
    }

    fn peek_budget(view: &StateView<'_>) -> Result<String, StateReadError> {
        view.get(Field::Budget).map(str::to_string)
    }

    fn state() -> PipelineState {
        PipelineState::new(PurchaseRequest::new("Chair", "$90", "", "")).unwrap()
    }

    #[tokio::test]
    async fn test_prompt_stage_executes_once() {
        let backend = Arc::new(ScriptedBackend::fixed("fine"));
        let invoker = ResilientInvoker::new(backend.clone(), "m", 0.7);
        let stage = PromptStage::new(
            "budget",
            Topic::Budget,
            [Field::Product],
            OutputField::BudgetEvaluation,
            echo_product,
        );

        let state = state();
        let view = StateView::new(&state, stage.name(), stage.reads());
        let output = stage.execute(view, &invoker).await.unwrap();

        assert_eq!(output.stage, "budget");
        assert_eq!(output.field, OutputField::BudgetEvaluation);
        assert_eq!(output.status, StageStatus::Ok);
        assert_eq!(output.content, "fine");
        assert_eq!(backend.prompts(), vec!["budget for Chair".to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_stage_degrades_by_topic() {
        let invoker = ResilientInvoker::new(Arc::new(UnreachableBackend::connection_refused()), "m", 0.7);
        let stage = PromptStage::new(
            "quality",
            Topic::Quality,
            [Field::Product],
            OutputField::QualityAssessment,
            echo_product,
        );

        let state = state();
        let output = stage
            .execute(StateView::new(&state, stage.name(), stage.reads()), &invoker)
            .await
            .unwrap();

        assert!(output.is_degraded());
        assert!(output.content.contains("**Mock Quality**"));
    }

    #[tokio::test]
    async fn test_undeclared_read_fails_before_invoking() {
        let backend = Arc::new(ScriptedBackend::fixed("unused"));
        let invoker = ResilientInvoker::new(backend.clone(), "m", 0.7);
        let stage = PromptStage::new(
            "sneaky",
            Topic::Budget,
            [Field::Product],
            OutputField::BudgetEvaluation,
            peek_budget,
        );

        let state = state();
        let err = stage
            .execute(StateView::new(&state, stage.name(), stage.reads()), &invoker)
            .await
            .unwrap_err();

        assert!(matches!(err, StateReadError::Undeclared { field: Field::Budget, .. }));
        assert_eq!(backend.call_count(), 0);
    }
}
