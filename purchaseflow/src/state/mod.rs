//! Shared pipeline state.
//!
//! A [`PipelineState`] carries the four request inputs and accumulates the
//! five stage outputs. Inputs are fixed at construction; each output starts
//! empty and is written exactly once through [`PipelineState::apply`].
//! Stages never see the state directly, only a [`StateView`] restricted to
//! their declared read-set.

mod fields;
mod view;

pub use fields::{Field, OutputField};
pub use view::StateView;

use crate::errors::{InputValidationError, OutputConflictError};
use serde::{Deserialize, Serialize};

/// A prospective purchase as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// What the user wants to buy.
    pub product: String,
    /// How much they intend to spend, free-form (e.g. "$1000").
    pub budget: String,
    /// What the item is for. May be empty.
    #[serde(default)]
    pub purpose: String,
    /// Desired traits. May be empty.
    #[serde(default)]
    pub preferences: String,
}

impl PurchaseRequest {
    /// Creates a new purchase request.
    #[must_use]
    pub fn new(
        product: impl Into<String>,
        budget: impl Into<String>,
        purpose: impl Into<String>,
        preferences: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            budget: budget.into(),
            purpose: purpose.into(),
            preferences: preferences.into(),
        }
    }

    /// Checks that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns an error naming every required field that is empty or
    /// whitespace-only.
    pub fn validate(&self) -> Result<(), InputValidationError> {
        let missing: Vec<Field> = [(Field::Product, &self.product), (Field::Budget, &self.budget)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputValidationError::new(missing))
        }
    }
}

/// A single-field update produced by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// The output field being written.
    pub field: OutputField,
    /// The complete text for that field.
    pub content: String,
}

impl StateUpdate {
    /// Creates a new state update.
    #[must_use]
    pub fn new(field: OutputField, content: impl Into<String>) -> Self {
        Self {
            field,
            content: content.into(),
        }
    }
}

/// The record threaded through every stage of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    product: String,
    budget: String,
    purpose: String,
    preferences: String,
    necessity_analysis: Option<String>,
    budget_evaluation: Option<String>,
    quality_assessment: Option<String>,
    alternatives: Option<String>,
    final_recommendation: Option<String>,
}

impl PipelineState {
    /// Creates a fresh state from a validated request.
    ///
    /// # Errors
    ///
    /// Returns an error if the product or budget is missing.
    pub fn new(request: PurchaseRequest) -> Result<Self, InputValidationError> {
        request.validate()?;
        Ok(Self {
            product: request.product,
            budget: request.budget,
            purpose: request.purpose,
            preferences: request.preferences,
            necessity_analysis: None,
            budget_evaluation: None,
            quality_assessment: None,
            alternatives: None,
            final_recommendation: None,
        })
    }

    /// Returns the product.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Returns the budget.
    #[must_use]
    pub fn budget(&self) -> &str {
        &self.budget
    }

    /// Returns the purpose.
    #[must_use]
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// Returns the preferences.
    #[must_use]
    pub fn preferences(&self) -> &str {
        &self.preferences
    }

    /// Returns an output field, if its stage has run.
    #[must_use]
    pub fn output(&self, field: OutputField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Returns any field. Inputs are always present.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Product => Some(&self.product),
            Field::Budget => Some(&self.budget),
            Field::Purpose => Some(&self.purpose),
            Field::Preferences => Some(&self.preferences),
            _ => field.as_output().and_then(|output| self.output(output)),
        }
    }

    /// Merges a stage's update into the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has already been written.
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), OutputConflictError> {
        let slot = self.slot_mut(update.field);
        if slot.is_some() {
            return Err(OutputConflictError::new(update.field));
        }
        *slot = Some(update.content);
        Ok(())
    }

    /// Returns true once every output field has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        OutputField::ALL.iter().all(|field| self.slot(*field).is_some())
    }

    /// Returns the output fields that are still empty.
    #[must_use]
    pub fn pending_outputs(&self) -> Vec<OutputField> {
        OutputField::ALL
            .into_iter()
            .filter(|field| self.slot(*field).is_none())
            .collect()
    }

    fn slot(&self, field: OutputField) -> &Option<String> {
        match field {
            OutputField::NecessityAnalysis => &self.necessity_analysis,
            OutputField::BudgetEvaluation => &self.budget_evaluation,
            OutputField::QualityAssessment => &self.quality_assessment,
            OutputField::Alternatives => &self.alternatives,
            OutputField::FinalRecommendation => &self.final_recommendation,
        }
    }

    fn slot_mut(&mut self, field: OutputField) -> &mut Option<String> {
        match field {
            OutputField::NecessityAnalysis => &mut self.necessity_analysis,
            OutputField::BudgetEvaluation => &mut self.budget_evaluation,
            OutputField::QualityAssessment => &mut self.quality_assessment,
            OutputField::Alternatives => &mut self.alternatives,
            OutputField::FinalRecommendation => &mut self.final_recommendation,
        }
    }
}

/// The five analyses handed back to the caller of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Need-versus-want verdict.
    pub necessity_analysis: String,
    /// Budget realism check.
    pub budget_evaluation: String,
    /// Quality markers to look for.
    pub quality_assessment: String,
    /// A cheaper and a different option.
    pub alternatives: String,
    /// Buy / Wait / Buy Alternative.
    pub final_recommendation: String,
}

impl TryFrom<PipelineState> for Recommendation {
    type Error = PipelineState;

    /// Fails, handing the state back, if any output is still empty.
    fn try_from(state: PipelineState) -> Result<Self, Self::Error> {
        if !state.is_complete() {
            return Err(state);
        }
        Ok(Self {
            necessity_analysis: state.necessity_analysis.unwrap_or_default(),
            budget_evaluation: state.budget_evaluation.unwrap_or_default(),
            quality_assessment: state.quality_assessment.unwrap_or_default(),
            alternatives: state.alternatives.unwrap_or_default(),
            final_recommendation: state.final_recommendation.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn laptop() -> PipelineState {
        PipelineState::new(PurchaseRequest::new("Laptop", "$800", "work", "")).unwrap()
    }

    #[test]
    fn test_request_requires_product_and_budget() {
        let err = PurchaseRequest::new("", "$100", "p", "q").validate().unwrap_err();
        assert_eq!(err.missing, vec![Field::Product]);

        let err = PurchaseRequest::new("Laptop", "", "p", "q").validate().unwrap_err();
        assert_eq!(err.missing, vec![Field::Budget]);

        let err = PurchaseRequest::new("  ", "\t", "", "").validate().unwrap_err();
        assert_eq!(err.missing, vec![Field::Product, Field::Budget]);
    }

    #[test]
    fn test_request_allows_empty_purpose_and_preferences() {
        assert!(PurchaseRequest::new("Desk", "$200", "", "").validate().is_ok());
    }

    #[test]
    fn test_new_state_has_empty_outputs() {
        let state = laptop();
        assert!(!state.is_complete());
        assert_eq!(state.pending_outputs(), OutputField::ALL.to_vec());
        assert_eq!(state.get(Field::Product), Some("Laptop"));
        assert_eq!(state.get(Field::Preferences), Some(""));
        assert_eq!(state.get(Field::Alternatives), None);
    }

    #[test]
    fn test_apply_writes_once() {
        let mut state = laptop();
        state
            .apply(StateUpdate::new(OutputField::NecessityAnalysis, "A need."))
            .unwrap();
        assert_eq!(state.output(OutputField::NecessityAnalysis), Some("A need."));

        let err = state
            .apply(StateUpdate::new(OutputField::NecessityAnalysis, "A want."))
            .unwrap_err();
        assert_eq!(err.field, OutputField::NecessityAnalysis);
        assert_eq!(state.output(OutputField::NecessityAnalysis), Some("A need."));
    }

    #[test]
    fn test_recommendation_requires_complete_state() {
        let mut state = laptop();
        state
            .apply(StateUpdate::new(OutputField::NecessityAnalysis, "n"))
            .unwrap();
        let state = Recommendation::try_from(state).unwrap_err();

        let mut state = state;
        for field in state.pending_outputs() {
            state.apply(StateUpdate::new(field, field.as_str())).unwrap();
        }
        let rec = Recommendation::try_from(state).unwrap();
        assert_eq!(rec.necessity_analysis, "n");
        assert_eq!(rec.final_recommendation, "final_recommendation");
    }
}
