//! Pipeline building and execution.
//!
//! This module provides:
//! - A builder that validates stage order and field ownership
//! - The sequential chain executor
//! - The [`PurchaseAdvisor`] entry point wiring the standard chain to an
//!   injected backend

mod advisor;
mod builder;
mod chain;

pub use advisor::{AdvisorRun, PurchaseAdvisor, ADVISOR_PIPELINE};
pub use builder::PipelineBuilder;
pub use chain::StageChain;
