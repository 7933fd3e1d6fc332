//! The five purchase-advisor stages.

use super::{PromptStage, Stage};
use crate::errors::StateReadError;
use crate::llm::Topic;
use crate::state::{Field, OutputField, StateView};
use std::sync::Arc;

/// Classifies the purchase as a need or a want.
#[must_use]
pub fn necessity_stage() -> PromptStage {
    PromptStage::new(
        "necessity",
        Topic::Necessity,
        [Field::Product, Field::Purpose],
        OutputField::NecessityAnalysis,
        necessity_prompt,
    )
}

/// Judges whether the budget is realistic.
#[must_use]
pub fn budget_stage() -> PromptStage {
    PromptStage::new(
        "budget",
        Topic::Budget,
        [Field::Product, Field::Budget],
        OutputField::BudgetEvaluation,
        budget_prompt,
    )
}

/// Lists quality, durability and value markers.
#[must_use]
pub fn quality_stage() -> PromptStage {
    PromptStage::new(
        "quality",
        Topic::Quality,
        [Field::Product, Field::Preferences],
        OutputField::QualityAssessment,
        quality_prompt,
    )
}

/// Proposes a cheaper option and a different one.
#[must_use]
pub fn alternatives_stage() -> PromptStage {
    PromptStage::new(
        "alternatives",
        Topic::Alternatives,
        [Field::Product, Field::Purpose, Field::Budget],
        OutputField::Alternatives,
        alternatives_prompt,
    )
}

/// Synthesizes the four earlier analyses into a verdict.
#[must_use]
pub fn finalize_stage() -> PromptStage {
    PromptStage::new(
        "finalize",
        Topic::Recommendation,
        [
            Field::Product,
            Field::NecessityAnalysis,
            Field::BudgetEvaluation,
            Field::QualityAssessment,
            Field::Alternatives,
        ],
        OutputField::FinalRecommendation,
        finalize_prompt,
    )
}

/// The advisor chain, in execution order.
#[must_use]
pub fn advisor_stages() -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(necessity_stage()),
        Arc::new(budget_stage()),
        Arc::new(quality_stage()),
        Arc::new(alternatives_stage()),
        Arc::new(finalize_stage()),
    ]
}

fn necessity_prompt(view: &StateView<'_>) -> Result<String, StateReadError> {
    let product = view.get(Field::Product)?;
    let purpose = view.get(Field::Purpose)?;
    Ok(format!(
        "You are a wise shopping assistant.\n\
         User wants to buy: {product}\n\
         Purpose: {purpose}\n\n\
         Analyze if this purchase is a NECESSITY or a WANT based on the purpose.\n\
         Explain why in 2-3 sentences."
    ))
}

fn budget_prompt(view: &StateView<'_>) -> Result<String, StateReadError> {
    let product = view.get(Field::Product)?;
    let budget = view.get(Field::Budget)?;
    Ok(format!(
        "User wants to buy: {product}\n\
         Budget: {budget}\n\n\
         Is this budget realistic for a good quality version of this product?\n\
         If it's too low, warn them. If it's generous, mention that.\n\
         Provide 1 cost-saving tip."
    ))
}

fn quality_prompt(view: &StateView<'_>) -> Result<String, StateReadError> {
    let product = view.get(Field::Product)?;
    let preferences = view.get(Field::Preferences)?;
    Ok(format!(
        "User Product: {product}\n\
         Preferences: {preferences}\n\n\
         What are the key markers of QUALITY for this product?\n\
         What determines durability and value for money?\n\
         Keep it brief (bullet points)."
    ))
}

fn alternatives_prompt(view: &StateView<'_>) -> Result<String, StateReadError> {
    let product = view.get(Field::Product)?;
    let purpose = view.get(Field::Purpose)?;
    let budget = view.get(Field::Budget)?;
    Ok(format!(
        "User wants: {product} for {purpose}.\n\
         Budget: {budget}\n\n\
         Suggest 2 alternatives:\n\
         1. A Cheaper option that still does the job.\n\
         2. A Better/Different option they might not have thought of."
    ))
}

fn finalize_prompt(view: &StateView<'_>) -> Result<String, StateReadError> {
    let product = view.get(Field::Product)?;
    let necessity = view.get(Field::NecessityAnalysis)?;
    let budget = view.get(Field::BudgetEvaluation)?;
    let quality = view.get(Field::QualityAssessment)?;
    let alternatives = view.get(Field::Alternatives)?;
    Ok(format!(
        "Synthesize the following into a final recommendation for the user.\n\n\
         Product: {product}\n\
         Necessity: {necessity}\n\
         Budget Check: {budget}\n\
         Quality Check: {quality}\n\
         Alternatives: {alternatives}\n\n\
         Give a Final Verdict: Buy, Wait, or Buy Alternative?\n\
         Keep it friendly and decisive."
    ))
}
