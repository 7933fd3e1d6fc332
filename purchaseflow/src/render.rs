//! Plain-text rendering of advisor results.

use crate::state::{OutputField, PipelineState, Recommendation};
use std::fmt::Write as _;

fn section_icon(field: OutputField) -> &'static str {
    match field {
        OutputField::NecessityAnalysis => "🔍",
        OutputField::BudgetEvaluation => "💰",
        OutputField::QualityAssessment => "⭐",
        OutputField::Alternatives => "🔄",
        OutputField::FinalRecommendation => "🏁",
    }
}

fn render_with<'a>(lookup: impl Fn(OutputField) -> Option<&'a str>) -> String {
    let mut out = String::new();
    for field in OutputField::ALL {
        let body = lookup(field)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| field.placeholder());
        let level = if field == OutputField::FinalRecommendation { "##" } else { "###" };
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{level} {} {}\n\n{body}\n", section_icon(field), field.title());
    }
    out
}

/// Renders the five sections of a state as Markdown, substituting the
/// placeholder text for any section that is missing or blank.
#[must_use]
pub fn render_markdown(state: &PipelineState) -> String {
    render_with(|field| state.output(field))
}

/// Renders a finished recommendation as Markdown.
#[must_use]
pub fn render_recommendation(rec: &Recommendation) -> String {
    render_with(|field| {
        Some(match field {
            OutputField::NecessityAnalysis => rec.necessity_analysis.as_str(),
            OutputField::BudgetEvaluation => rec.budget_evaluation.as_str(),
            OutputField::QualityAssessment => rec.quality_assessment.as_str(),
            OutputField::Alternatives => rec.alternatives.as_str(),
            OutputField::FinalRecommendation => rec.final_recommendation.as_str(),
        })
    })
}
