//! Canned fallback content for degraded invocations.
//!
//! The catalog is an ordered list of topics. When a topic is not known up
//! front, [`Topic::detect`] walks [`Topic::PRIORITY`] and takes the first
//! keyword found in the prompt; with no match the generic apology is used.

use crate::errors::{BackendError, FailureKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject of a prompt, used to pick fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Need versus want.
    Necessity,
    /// Budget realism.
    Budget,
    /// Quality markers.
    Quality,
    /// Other options.
    Alternatives,
    /// Final verdict.
    Recommendation,
}

impl Topic {
    /// Detection order. Earlier entries win when several keywords appear.
    pub const PRIORITY: [Self; 5] = [
        Self::Necessity,
        Self::Budget,
        Self::Quality,
        Self::Alternatives,
        Self::Recommendation,
    ];

    /// Lowercase keyword that identifies the topic in prompt text.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Necessity => "necessity",
            Self::Budget => "budget",
            Self::Quality => "quality",
            Self::Alternatives => "alternative",
            Self::Recommendation => "recommendation",
        }
    }

    /// Finds the first catalog topic mentioned in a prompt, case-insensitively.
    #[must_use]
    pub fn detect(prompt: &str) -> Option<Self> {
        let lower = prompt.to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|topic| lower.contains(topic.keyword()))
    }

    /// Bold label opening the fallback text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Necessity => "Mock Analysis",
            Self::Budget => "Mock Budget",
            Self::Quality => "Mock Quality",
            Self::Alternatives => "Mock Alternatives",
            Self::Recommendation => "Mock Verdict",
        }
    }

    fn body(self) -> &'static str {
        match self {
            Self::Necessity => {
                "Based on standard necessity criteria, this item appears to be a **WANT**."
            }
            Self::Budget => "Your budget seems reasonable for a mid-range option.",
            Self::Quality => {
                "Key quality markers include build materials and brand reputation."
            }
            Self::Alternatives => {
                "1. **Option A**: A budget competitor.\n2. **Option B**: A premium alternative."
            }
            Self::Recommendation => "**WAIT**. Check your local LLM configuration.",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Returns the remediation hint for a failure.
#[must_use]
pub fn remediation_hint(kind: FailureKind, model: &str) -> String {
    match kind {
        FailureKind::ModelNotFound => {
            format!("Model '{model}' not found. Run `ollama pull {model}` in your terminal.")
        }
        FailureKind::ConnectionRefused => "Ollama connection refused. Run `ollama serve`.".to_string(),
        FailureKind::Timeout | FailureKind::Other => "Please check if Ollama is running.".to_string(),
    }
}

/// Builds the substitute text returned in place of a failed completion.
#[must_use]
pub fn fallback_content(topic: Option<Topic>, error: &BackendError, model: &str) -> String {
    let hint = remediation_hint(error.kind, model);
    match topic {
        Some(topic) => format!(
            "⚠️ **{}**: (Error: {hint})\n\n{}",
            topic.label(),
            topic.body()
        ),
        None => format!(
            "⚠️ **Mock Response** (System Error): {}\n\n**Fix**: {hint}\n\nThis is a simulated response.",
            error.message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refused() -> BackendError {
        BackendError::new(FailureKind::ConnectionRefused, "Connection refused (os error 111)")
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(Topic::detect("Is this a NECESSITY?"), Some(Topic::Necessity));
        assert_eq!(Topic::detect("Suggest 2 Alternatives"), Some(Topic::Alternatives));
        assert_eq!(Topic::detect("hello there"), None);
    }

    #[test]
    fn test_detect_follows_priority() {
        // budget outranks alternative
        assert_eq!(
            Topic::detect("Suggest an alternative. Budget: $100"),
            Some(Topic::Budget)
        );
        assert_eq!(
            Topic::detect("final recommendation on quality"),
            Some(Topic::Quality)
        );
    }

    #[test]
    fn test_remediation_hints() {
        assert_eq!(
            remediation_hint(FailureKind::ModelNotFound, "llama3.2:1b"),
            "Model 'llama3.2:1b' not found. Run `ollama pull llama3.2:1b` in your terminal."
        );
        assert!(remediation_hint(FailureKind::ConnectionRefused, "m").contains("ollama serve"));
        assert_eq!(
            remediation_hint(FailureKind::Timeout, "m"),
            "Please check if Ollama is running."
        );
    }

    #[test]
    fn test_topic_fallback_content() {
        let text = fallback_content(Some(Topic::Necessity), &refused(), "m");
        assert!(text.starts_with("⚠️ **Mock Analysis**: (Error: Ollama connection refused."));
        assert!(text.contains("**WANT**"));

        let text = fallback_content(Some(Topic::Recommendation), &refused(), "m");
        assert!(text.contains("**Mock Verdict**"));
        assert!(text.contains("**WAIT**"));
    }

    #[test]
    fn test_generic_fallback_mentions_error() {
        let text = fallback_content(None, &refused(), "m");
        assert!(text.contains("**Mock Response** (System Error): Connection refused (os error 111)"));
        assert!(text.contains("**Fix**: Ollama connection refused."));
        for topic in Topic::PRIORITY {
            assert!(!text.contains(topic.label()));
        }
    }
}
