//! Core result types for purchaseflow runs.
//!
//! - Stage status enum
//! - Per-stage output and the run report
//! - Lifecycle events

mod event;
mod output;
mod status;

pub use event::StageEvent;
pub use output::{RunReport, StageOutput};
pub use status::StageStatus;
