//! Sample inputs for tests.

use crate::state::{OutputField, PipelineState, PurchaseRequest, StateUpdate};

/// A complete, valid purchase request.
#[must_use]
pub fn sample_request() -> PurchaseRequest {
    PurchaseRequest::new(
        "Gaming Laptop",
        "$1000",
        "coding and gaming",
        "light, good battery",
    )
}

/// A fresh state for [`sample_request`].
///
/// # Panics
///
/// Never; the sample request is valid.
#[must_use]
pub fn sample_state() -> PipelineState {
    PipelineState::new(sample_request()).unwrap_or_else(|e| panic!("sample request rejected: {e}"))
}

/// A state with every output written as `<field_name>`.
#[must_use]
pub fn written_state() -> PipelineState {
    let mut state = sample_state();
    for field in OutputField::ALL {
        // Fresh state; no field is written yet.
        let _ = state.apply(StateUpdate::new(field, format!("<{field}>")));
    }
    state
}
