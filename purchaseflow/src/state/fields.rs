//! Field identifiers for the pipeline state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Any field of the pipeline state, input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// The product the user wants.
    Product,
    /// The user's budget.
    Budget,
    /// What the product is for.
    Purpose,
    /// Desired traits.
    Preferences,
    /// Output of the necessity stage.
    NecessityAnalysis,
    /// Output of the budget stage.
    BudgetEvaluation,
    /// Output of the quality stage.
    QualityAssessment,
    /// Output of the alternatives stage.
    Alternatives,
    /// Output of the finalize stage.
    FinalRecommendation,
}

impl Field {
    /// Returns true for the four request inputs.
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(
            self,
            Self::Product | Self::Budget | Self::Purpose | Self::Preferences
        )
    }

    /// Narrows to an output field.
    #[must_use]
    pub fn as_output(self) -> Option<OutputField> {
        match self {
            Self::NecessityAnalysis => Some(OutputField::NecessityAnalysis),
            Self::BudgetEvaluation => Some(OutputField::BudgetEvaluation),
            Self::QualityAssessment => Some(OutputField::QualityAssessment),
            Self::Alternatives => Some(OutputField::Alternatives),
            Self::FinalRecommendation => Some(OutputField::FinalRecommendation),
            Self::Product | Self::Budget | Self::Purpose | Self::Preferences => None,
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Budget => "budget",
            Self::Purpose => "purpose",
            Self::Preferences => "preferences",
            Self::NecessityAnalysis => "necessity_analysis",
            Self::BudgetEvaluation => "budget_evaluation",
            Self::QualityAssessment => "quality_assessment",
            Self::Alternatives => "alternatives",
            Self::FinalRecommendation => "final_recommendation",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field written by exactly one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    /// Need-versus-want verdict.
    NecessityAnalysis,
    /// Budget realism check.
    BudgetEvaluation,
    /// Quality markers.
    QualityAssessment,
    /// Suggested alternatives.
    Alternatives,
    /// Final verdict.
    FinalRecommendation,
}

impl OutputField {
    /// All output fields, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::NecessityAnalysis,
        Self::BudgetEvaluation,
        Self::QualityAssessment,
        Self::Alternatives,
        Self::FinalRecommendation,
    ];

    /// Returns the snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        Field::from(self).as_str()
    }

    /// Section heading used when rendering results.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::NecessityAnalysis => "Purchase Necessity",
            Self::BudgetEvaluation => "Budget Check",
            Self::QualityAssessment => "Quality Assessment",
            Self::Alternatives => "Alternatives",
            Self::FinalRecommendation => "Final Verdict",
        }
    }

    /// Text shown in place of an empty field.
    #[must_use]
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::NecessityAnalysis => "No analysis available",
            Self::BudgetEvaluation => "No evaluation available",
            Self::QualityAssessment => "No assessment available",
            Self::Alternatives => "No alternatives available",
            Self::FinalRecommendation => "No verdict available",
        }
    }
}

impl From<OutputField> for Field {
    fn from(field: OutputField) -> Self {
        match field {
            OutputField::NecessityAnalysis => Self::NecessityAnalysis,
            OutputField::BudgetEvaluation => Self::BudgetEvaluation,
            OutputField::QualityAssessment => Self::QualityAssessment,
            OutputField::Alternatives => Self::Alternatives,
            OutputField::FinalRecommendation => Self::FinalRecommendation,
        }
    }
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_round_trips_through_field() {
        for output in OutputField::ALL {
            let field = Field::from(output);
            assert!(!field.is_input());
            assert_eq!(field.as_output(), Some(output));
        }
    }

    #[test]
    fn test_inputs_have_no_output() {
        for field in [Field::Product, Field::Budget, Field::Purpose, Field::Preferences] {
            assert!(field.is_input());
            assert_eq!(field.as_output(), None);
        }
    }

    #[test]
    fn test_field_serialize() {
        let json = serde_json::to_string(&Field::FinalRecommendation).unwrap();
        assert_eq!(json, r#""final_recommendation""#);
        assert_eq!(OutputField::QualityAssessment.to_string(), "quality_assessment");
    }
}
