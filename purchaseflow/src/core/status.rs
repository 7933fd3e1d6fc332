//! Stage status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stage's output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The backend produced the text.
    Ok,
    /// The backend failed and the text is a fallback.
    Degraded,
}

impl Default for StageStatus {
    fn default() -> Self {
        Self::Ok
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

impl StageStatus {
    /// Maps the invoker's degraded flag to a status.
    #[must_use]
    pub fn from_degraded(degraded: bool) -> Self {
        if degraded {
            Self::Degraded
        } else {
            Self::Ok
        }
    }

    /// Returns true if the output is fallback text.
    #[must_use]
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }
}
