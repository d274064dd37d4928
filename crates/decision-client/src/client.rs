//! Decision client: history trimming, validation, and the retry policy.

use tracing::{debug, warn};

use crate::errors::DecisionError;
use crate::provider::DecisionProvider;
use crate::types::{ActionDecision, DecisionContext};
use crate::validate::validate_decision;

/// Default number of prior decisions included in each request.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Default threshold below which a decision is flagged as low-confidence.
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Wraps a [`DecisionProvider`] with the client-side policy the
/// orchestrator relies on: bounded history, schema validation, one retry
/// with an error hint, and low-confidence surfacing.
pub struct DecisionClient<P> {
    provider: P,
    history_window: usize,
    low_confidence_threshold: f32,
}

impl<P: DecisionProvider> DecisionClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            history_window: DEFAULT_HISTORY_WINDOW,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_low_confidence_threshold(mut self, threshold: f32) -> Self {
        self.low_confidence_threshold = threshold;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Obtain one schema-valid decision for the given context.
    ///
    /// A malformed response is retried exactly once with the validation
    /// error appended as a hint; a second consecutive fault escalates to
    /// [`DecisionError::Malformed`]. Transport failures are never retried
    /// here.
    pub async fn decide(&self, mut ctx: DecisionContext) -> Result<ActionDecision, DecisionError> {
        let start = ctx.history.len().saturating_sub(self.history_window);
        ctx.history.drain(..start);

        let first_fault = match self.attempt(&ctx, None).await {
            Ok(decision) => return Ok(self.surface_confidence(decision)),
            Err(err) if err.is_transient() => err.to_string(),
            Err(err) => return Err(err),
        };

        debug!(fault = %first_fault, "decision fault, retrying with hint");
        match self.attempt(&ctx, Some(&first_fault)).await {
            Ok(decision) => Ok(self.surface_confidence(decision)),
            Err(err) if err.is_transient() => Err(DecisionError::Malformed {
                last: err.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn attempt(
        &self,
        ctx: &DecisionContext,
        hint: Option<&str>,
    ) -> Result<ActionDecision, DecisionError> {
        let decision = self.provider.request_decision(ctx, hint).await?;
        validate_decision(&decision)?;
        Ok(decision)
    }

    /// Low confidence is not a fault; it is noted in the reasoning that
    /// ends up on the captured state, and logged.
    fn surface_confidence(&self, mut decision: ActionDecision) -> ActionDecision {
        if decision.confidence < self.low_confidence_threshold {
            warn!(
                confidence = decision.confidence,
                threshold = self.low_confidence_threshold,
                "low-confidence decision"
            );
            let note = format!(" [low confidence {:.2}]", decision.confidence);
            decision.reasoning.push_str(&note);
        }
        decision
    }
}
