//! # Purchaseflow
//!
//! A purchase advisor built as a fixed chain of five LLM stages.
//!
//! Given a product, a budget, a purpose and preferences, the advisor asks a
//! local Ollama model for:
//!
//! - **Necessity**: is this a need or a want?
//! - **Budget**: is the budget realistic?
//! - **Quality**: what marks a good one?
//! - **Alternatives**: a cheaper option and a different one
//! - **Final verdict**: Buy, Wait, or Buy Alternative
//!
//! Every call goes through a [`ResilientInvoker`](llm::ResilientInvoker),
//! which replaces backend failures with canned, clearly marked fallback
//! text. A run therefore always yields all five analyses.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use purchaseflow::prelude::*;
//!
//! let advisor = PurchaseAdvisor::ollama(&AdvisorConfig::from_env()?)?;
//! let rec = advisor
//!     .run("Gaming Laptop", "$1000", "coding and gaming", "light")
//!     .await?;
//! println!("{}", rec.final_recommendation);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod bootstrap;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod stages;
pub mod state;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::AdvisorConfig;
    pub use crate::core::{RunReport, StageEvent, StageOutput, StageStatus};
    pub use crate::errors::{
        BackendError, ConfigError, FailureKind, InputValidationError,
        PipelineValidationError, PurchaseflowError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::llm::{ChatBackend, InvocationResult, OllamaBackend, ResilientInvoker, Topic};
    pub use crate::pipeline::{AdvisorRun, PipelineBuilder, PurchaseAdvisor, StageChain};
    pub use crate::render::render_markdown;
    pub use crate::stages::{PromptStage, Stage};
    pub use crate::state::{
        Field, OutputField, PipelineState, PurchaseRequest, Recommendation, StateView,
    };
}
