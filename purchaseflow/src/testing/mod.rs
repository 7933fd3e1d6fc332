//! Testing utilities for purchaseflow.
//!
//! This module provides:
//! - Scripted and failing chat backends
//! - Sample requests and states

mod fixtures;
mod mocks;

pub use fixtures::{sample_request, sample_state, written_state};
pub use mocks::{ScriptedBackend, UnreachableBackend};
