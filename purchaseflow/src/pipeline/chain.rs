//! Sequential stage-chain executor.

use crate::core::{RunReport, StageEvent};
use crate::errors::PurchaseflowError;
use crate::events::EventSink;
use crate::llm::ResilientInvoker;
use crate::stages::Stage;
use crate::state::{PipelineState, StateView};
use crate::utils::{generate_run_id, iso_timestamp};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// A validated, ordered list of stages.
///
/// Built by [`PipelineBuilder`](super::PipelineBuilder). Stages run one at
/// a time; each stage's update is merged into the state before the next
/// stage starts.
#[derive(Debug, Clone)]
pub struct StageChain {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl StageChain {
    pub(super) fn new(name: String, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { name, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage and returns the final state.
    ///
    /// # Errors
    ///
    /// See [`run_with_report`](Self::run_with_report).
    pub async fn run(
        &self,
        state: PipelineState,
        invoker: &ResilientInvoker,
        sink: &dyn EventSink,
    ) -> Result<PipelineState, PurchaseflowError> {
        self.run_with_report(state, invoker, sink)
            .await
            .map(|(state, _)| state)
    }

    /// Runs every stage and returns the final state with a run report.
    ///
    /// Backend failures never abort the run. The only errors are structural:
    /// a stage reading outside its view, or a state whose outputs were
    /// already written.
    pub async fn run_with_report(
        &self,
        mut state: PipelineState,
        invoker: &ResilientInvoker,
        sink: &dyn EventSink,
    ) -> Result<(PipelineState, RunReport), PurchaseflowError> {
        let run_id = generate_run_id().to_string();
        let span = info_span!("pipeline", pipeline = %self.name, run_id = %run_id);

        async move {
            let started_at = iso_timestamp();
            let start = Instant::now();
            let mut outputs = Vec::with_capacity(self.stages.len());

            sink.emit(StageEvent::pipeline_started(&self.name, &run_id)).await;
            info!(stages = self.stages.len(), "pipeline started");

            for stage in &self.stages {
                sink.emit(StageEvent::stage_started(stage.name())).await;

                let view = StateView::new(&state, stage.name(), stage.reads());
                let output = stage.execute(view, invoker).await?;

                if output.is_degraded() {
                    warn!(stage = %stage.name(), field = %output.field, "stage produced fallback output");
                    sink.emit(StageEvent::stage_degraded(stage.name(), output.field.as_str()))
                        .await;
                }

                state.apply(output.to_update())?;
                info!(
                    stage = %stage.name(),
                    status = %output.status,
                    duration_ms = output.duration_ms,
                    "stage completed"
                );
                sink.emit(StageEvent::stage_completed(
                    stage.name(),
                    output.field.as_str(),
                    output.duration_ms,
                ))
                .await;
                outputs.push(output);
            }

            let report = RunReport {
                run_id: run_id.clone(),
                pipeline: self.name.clone(),
                started_at,
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                stages: outputs,
            };
            let degraded = report.degraded_stages().len();
            info!(degraded_stages = degraded, duration_ms = report.duration_ms, "pipeline completed");
            sink.emit(StageEvent::pipeline_completed(
                &self.name,
                &run_id,
                degraded,
                report.duration_ms,
            ))
            .await;

            Ok::<_, PurchaseflowError>((state, report))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::pipeline::PipelineBuilder;
    use crate::stages::advisor_stages;
    use crate::state::{OutputField, StateUpdate};
    use crate::testing::{sample_request, ScriptedBackend, UnreachableBackend};
    use pretty_assertions::assert_eq;

    fn chain() -> StageChain {
        PipelineBuilder::new("purchase-advisor")
            .stages(advisor_stages())
            .build()
            .unwrap()
    }

    fn state() -> PipelineState {
        PipelineState::new(sample_request()).unwrap()
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let backend = Arc::new(ScriptedBackend::sequence(["n", "b", "q", "a", "Buy"]));
        let invoker = ResilientInvoker::new(backend.clone(), "m", 0.7);

        let final_state = chain().run(state(), &invoker, &NoOpEventSink).await.unwrap();

        assert_eq!(final_state.output(OutputField::NecessityAnalysis), Some("n"));
        assert_eq!(final_state.output(OutputField::BudgetEvaluation), Some("b"));
        assert_eq!(final_state.output(OutputField::QualityAssessment), Some("q"));
        assert_eq!(final_state.output(OutputField::Alternatives), Some("a"));
        assert_eq!(final_state.output(OutputField::FinalRecommendation), Some("Buy"));
        assert_eq!(backend.call_count(), 5);
    }

    #[tokio::test]
    async fn test_events_follow_stage_order() {
        let invoker = ResilientInvoker::new(Arc::new(ScriptedBackend::fixed("ok")), "m", 0.7);
        let sink = CollectingEventSink::new();

        chain().run(state(), &invoker, &sink).await.unwrap();

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some("pipeline.started"));
        assert_eq!(types.last().map(String::as_str), Some("pipeline.completed"));
        assert_eq!(sink.events_of_type("stage.started").len(), 5);
        assert!(sink.events_of_type("stage.degraded").is_empty());

        let started: Vec<String> = sink
            .events_of_type("stage.started")
            .iter()
            .filter_map(|e| e.data_str("stage").map(str::to_string))
            .collect();
        assert_eq!(started, vec!["necessity", "budget", "quality", "alternatives", "finalize"]);
    }

    #[tokio::test]
    async fn test_report_marks_degraded_stages() {
        let invoker = ResilientInvoker::new(Arc::new(UnreachableBackend::connection_refused()), "m", 0.7);
        let sink = CollectingEventSink::new();

        let (final_state, report) = chain()
            .run_with_report(state(), &invoker, &sink)
            .await
            .unwrap();

        assert!(final_state.is_complete());
        assert_eq!(report.pipeline, "purchase-advisor");
        assert_eq!(report.stages.len(), 5);
        assert_eq!(report.degraded_stages().len(), 5);
        assert_eq!(sink.events_of_type("stage.degraded").len(), 5);
    }

    #[tokio::test]
    async fn test_already_written_state_conflicts() {
        let invoker = ResilientInvoker::new(Arc::new(ScriptedBackend::fixed("ok")), "m", 0.7);
        let mut used = state();
        used.apply(StateUpdate::new(OutputField::NecessityAnalysis, "old"))
            .unwrap();

        let err = chain().run(used, &invoker, &NoOpEventSink).await.unwrap_err();
        assert!(matches!(err, PurchaseflowError::OutputConflict(_)));
    }
}
