//! Pipeline builder with validation.

use super::StageChain;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::stages::Stage;
use crate::state::OutputField;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for creating validated stage chains.
///
/// Stages run in the order they are added. Each stage may read any input
/// field and any output written by a stage added before it.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages in order.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
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

    /// Validates the chain and builds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the chain is empty, two stages
    /// share a name or write the same field, or a stage reads an output that
    /// no earlier stage writes.
    pub fn build(self) -> Result<StageChain, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "Pipeline name cannot be empty or whitespace-only",
            ));
        }

        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages")
                .with_error_info(
                    ContractErrorInfo::new("CONTRACT-EMPTY", "Cannot build an empty pipeline")
                        .with_fix_hint("Add at least one stage to the pipeline before building."),
                ));
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut written: Vec<(OutputField, &str)> = Vec::new();

        for stage in &self.stages {
            if !names.insert(stage.name()) {
                return Err(PipelineValidationError::new(format!(
                    "Stage '{}' is defined more than once",
                    stage.name()
                ))
                .with_stages(vec![stage.name().to_string()])
                .with_error_info(
                    ContractErrorInfo::new("CONTRACT-DUPLICATE", "Stage names must be unique")
                        .with_fix_hint("Rename one of the stages."),
                ));
            }

            for field in stage.reads() {
                let Some(output) = field.as_output() else {
                    continue;
                };
                if !written.iter().any(|(f, _)| *f == output) {
                    return Err(PipelineValidationError::new(format!(
                        "Stage '{}' reads '{}' before any earlier stage writes it",
                        stage.name(),
                        output
                    ))
                    .with_stages(vec![stage.name().to_string()])
                    .with_error_info(
                        ContractErrorInfo::new(
                            "CONTRACT-READ-ORDER",
                            format!("Output '{output}' is not available to '{}'", stage.name()),
                        )
                        .with_fix_hint("Move the stage after the stage that writes the field."),
                    ));
                }
            }

            if let Some((_, owner)) = written.iter().find(|(f, _)| *f == stage.writes()) {
                return Err(PipelineValidationError::new(format!(
                    "Stages '{}' and '{}' both write '{}'",
                    owner,
                    stage.name(),
                    stage.writes()
                ))
                .with_stages(vec![(*owner).to_string(), stage.name().to_string()])
                .with_error_info(
                    ContractErrorInfo::new(
                        "CONTRACT-WRITE-CONFLICT",
                        "Each output field has exactly one owning stage",
                    )
                    .with_fix_hint("Give each stage its own output field."),
                ));
            }
            written.push((stage.writes(), stage.name()));
        }

        Ok(StageChain::new(self.name, self.stages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Topic;
    use crate::stages::{advisor_stages, budget_stage, finalize_stage, necessity_stage, PromptStage};
    use crate::state::{Field, StateView};

    fn dummy(_view: &StateView<'_>) -> Result<String, crate::errors::StateReadError> {
        Ok(String::new())
    }

    #[test]
    fn test_advisor_chain_builds() {
        let chain = PipelineBuilder::new("purchase-advisor")
            .stages(advisor_stages())
            .build()
            .unwrap();

        assert_eq!(chain.name(), "purchase-advisor");
        assert_eq!(
            chain.stage_names(),
            vec!["necessity", "budget", "quality", "alternatives", "finalize"]
        );
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::new("empty").build().unwrap_err();
        assert_eq!(err.code(), Some("CONTRACT-EMPTY"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = PipelineBuilder::new("  ")
            .stage(Arc::new(necessity_stage()))
            .build()
            .unwrap_err();
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_reading_a_later_output_is_rejected() {
        let err = PipelineBuilder::new("backwards")
            .stage(Arc::new(finalize_stage()))
            .stage(Arc::new(necessity_stage()))
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("CONTRACT-READ-ORDER"));
        assert_eq!(err.stages, vec!["finalize".to_string()]);
    }

    #[test]
    fn test_reading_own_output_is_rejected() {
        let selfish = PromptStage::new(
            "selfish",
            Topic::Budget,
            [Field::BudgetEvaluation],
            crate::state::OutputField::BudgetEvaluation,
            dummy,
        );
        let err = PipelineBuilder::new("p")
            .stage(Arc::new(selfish))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CONTRACT-READ-ORDER"));
    }

    #[test]
    fn test_duplicate_writer_rejected() {
        let copycat = PromptStage::new(
            "budget-again",
            Topic::Budget,
            [Field::Product],
            crate::state::OutputField::BudgetEvaluation,
            dummy,
        );
        let err = PipelineBuilder::new("p")
            .stage(Arc::new(budget_stage()))
            .stage(Arc::new(copycat))
            .build()
            .unwrap_err();

        assert_eq!(err.code(), Some("CONTRACT-WRITE-CONFLICT"));
        assert_eq!(err.stages, vec!["budget".to_string(), "budget-again".to_string()]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = PipelineBuilder::new("p")
            .stage(Arc::new(budget_stage()))
            .stage(Arc::new(budget_stage()))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CONTRACT-DUPLICATE"));
    }
}
