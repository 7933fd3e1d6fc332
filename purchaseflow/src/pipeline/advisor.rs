//! The purchase-advisor entry point.

use super::{PipelineBuilder, StageChain};
use crate::config::AdvisorConfig;
use crate::core::RunReport;
use crate::errors::PurchaseflowError;
use crate::events::{EventSink, NoOpEventSink};
use crate::llm::{ChatBackend, OllamaBackend, ResilientInvoker};
use crate::stages::advisor_stages;
use crate::state::{PipelineState, PurchaseRequest, Recommendation};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Name of the standard five-stage chain.
pub const ADVISOR_PIPELINE: &str = "purchase-advisor";

/// Final state and report of one advisor run.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorRun {
    /// The completed state.
    pub state: PipelineState,
    /// Per-stage details.
    pub report: RunReport,
}

/// Runs the necessity → budget → quality → alternatives → finalize chain
/// against an injected backend.
///
/// Each call to [`run`](Self::run) is independent; the advisor holds no
/// per-request state and can be shared across requests.
pub struct PurchaseAdvisor {
    chain: StageChain,
    invoker: ResilientInvoker,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PurchaseAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseAdvisor")
            .field("chain", &self.chain)
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

impl PurchaseAdvisor {
    /// Creates an advisor over the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(backend: Arc<dyn ChatBackend>, config: &AdvisorConfig) -> Result<Self, PurchaseflowError> {
        config.validate()?;
        let chain = PipelineBuilder::new(ADVISOR_PIPELINE)
            .stages(advisor_stages())
            .build()?;
        Ok(Self {
            chain,
            invoker: ResilientInvoker::from_config(backend, config),
            sink: Arc::new(NoOpEventSink),
        })
    }

    /// Creates an advisor talking to the Ollama server named in the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn ollama(config: &AdvisorConfig) -> Result<Self, PurchaseflowError> {
        config.validate()?;
        let backend = OllamaBackend::from_config(config)?;
        Self::new(Arc::new(backend), config)
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the stage chain.
    #[must_use]
    pub fn chain(&self) -> &StageChain {
        &self.chain
    }

    /// Returns the invoker.
    #[must_use]
    pub fn invoker(&self) -> &ResilientInvoker {
        &self.invoker
    }

    /// Analyzes a purchase and returns the five analyses.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseflowError::InvalidInput`] if the product or budget
    /// is empty; no backend call is made in that case. Backend failures
    /// never produce an error.
    pub async fn run(
        &self,
        product: &str,
        budget: &str,
        purpose: &str,
        preferences: &str,
    ) -> Result<Recommendation, PurchaseflowError> {
        let request = PurchaseRequest::new(product, budget, purpose, preferences);
        let outcome = self.run_request(request).await?;
        Recommendation::try_from(outcome.state).map_err(|state| {
            PurchaseflowError::Internal(format!(
                "pipeline finished with empty outputs: {:?}",
                state.pending_outputs()
            ))
        })
    }

    /// Analyzes a purchase request, returning the state and run report.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn run_request(&self, request: PurchaseRequest) -> Result<AdvisorRun, PurchaseflowError> {
        let state = PipelineState::new(request)?;
        info!(product = %state.product(), "analyzing purchase");

        let (state, report) = self
            .chain
            .run_with_report(state, &self.invoker, self.sink.as_ref())
            .await?;
        Ok(AdvisorRun { state, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BackendError, FailureKind};
    use crate::llm::MockChatBackend;

    #[tokio::test]
    async fn test_invalid_input_never_calls_backend() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat().times(0);
        let advisor = PurchaseAdvisor::new(Arc::new(mock), &AdvisorConfig::default()).unwrap();

        let err = advisor.run("", "$100", "p", "q").await.unwrap_err();
        assert!(matches!(err, PurchaseflowError::InvalidInput(_)));

        let err = advisor.run("Laptop", "", "p", "q").await.unwrap_err();
        assert!(matches!(err, PurchaseflowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_run_sends_configured_model() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat()
            .withf(|req| req.model == "phi3" && (req.temperature - 0.2).abs() < f32::EPSILON)
            .times(5)
            .returning(|_| Ok("Buy".to_string()));
        let config = AdvisorConfig::default().with_model("phi3").with_temperature(0.2);
        let advisor = PurchaseAdvisor::new(Arc::new(mock), &config).unwrap();

        let rec = advisor.run("Mouse", "$30", "", "").await.unwrap();
        assert_eq!(rec.final_recommendation, "Buy");
        assert!(!advisor.invoker().is_mock());
    }

    #[tokio::test]
    async fn test_unreachable_backend_still_completes() {
        let mut mock = MockChatBackend::new();
        mock.expect_chat().times(5).returning(|_| {
            Err(BackendError::new(FailureKind::Timeout, "operation timed out"))
        });
        let advisor = PurchaseAdvisor::new(Arc::new(mock), &AdvisorConfig::default()).unwrap();

        let rec = advisor.run("Mouse", "$30", "", "").await.unwrap();
        assert!(rec.necessity_analysis.contains("**Mock Analysis**"));
        assert!(rec.final_recommendation.contains("**WAIT**"));
        assert!(advisor.invoker().is_mock());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mock = MockChatBackend::new();
        let config = AdvisorConfig::default().with_model("");
        let err = PurchaseAdvisor::new(Arc::new(mock), &config).unwrap_err();
        assert!(matches!(err, PurchaseflowError::Config(_)));
    }

    #[test]
    fn test_ollama_advisor_uses_standard_chain() {
        let advisor = PurchaseAdvisor::ollama(&AdvisorConfig::default()).unwrap();
        assert_eq!(advisor.chain().name(), ADVISOR_PIPELINE);
        assert_eq!(advisor.chain().stage_count(), 5);
        assert_eq!(advisor.invoker().model(), "llama3.2:1b");
    }
}
