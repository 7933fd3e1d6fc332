//! Read-restricted state access for a single stage.

use super::{Field, PipelineState};
use crate::errors::StateReadError;

/// An immutable view of the pipeline state, limited to a stage's read-set.
///
/// Reading a field outside the read-set, or an output whose stage has not
/// run yet, is an error rather than an empty string.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    state: &'a PipelineState,
    stage: &'a str,
    reads: &'a [Field],
}

impl<'a> StateView<'a> {
    /// Creates a new view.
    #[must_use]
    pub fn new(state: &'a PipelineState, stage: &'a str, reads: &'a [Field]) -> Self {
        Self {
            state,
            stage,
            reads,
        }
    }

    /// Returns the name of the stage this view was made for.
    #[must_use]
    pub fn stage(&self) -> &str {
        self.stage
    }

    /// Reads a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`StateReadError::Undeclared`] if the field is not in the
    /// read-set and [`StateReadError::NotYetWritten`] if it is an output
    /// that is still empty.
    pub fn get(&self, field: Field) -> Result<&'a str, StateReadError> {
        if !self.reads.contains(&field) {
            return Err(StateReadError::Undeclared {
                stage: self.stage.to_string(),
                field,
            });
        }
        self.state
            .get(field)
            .ok_or_else(|| StateReadError::NotYetWritten {
                stage: self.stage.to_string(),
                field,
            })
    }
}
