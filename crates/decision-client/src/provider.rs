//! Provider abstraction over the vision-reasoning service.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::DecisionError;
use crate::types::{ActionDecision, DecisionContext};

/// One raw exchange with the reasoning service.
///
/// Implementations return whatever the service produced; schema validation
/// and the retry policy live in [`crate::DecisionClient`]. `hint` carries
/// error context from a previously rejected response so the service can
/// correct itself.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    async fn request_decision(
        &self,
        ctx: &DecisionContext,
        hint: Option<&str>,
    ) -> Result<ActionDecision, DecisionError>;
}

#[async_trait]
impl<T: DecisionProvider + ?Sized> DecisionProvider for Arc<T> {
    async fn request_decision(
        &self,
        ctx: &DecisionContext,
        hint: Option<&str>,
    ) -> Result<ActionDecision, DecisionError> {
        (**self).request_decision(ctx, hint).await
    }
}

/// Scripted response for offline providers.
#[derive(Clone, Debug)]
pub enum ScriptedResponse {
    Decision(ActionDecision),
    /// Simulates a response that failed to parse or validate.
    Malformed(String),
}

/// Deterministic provider used for tests and offline development.
///
/// Responses are served in order; once the script is exhausted the final
/// entry repeats forever, which makes "a service that never says done"
/// trivial to express.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Vec<ScriptedResponse>,
    cursor: Mutex<usize>,
    hints: Mutex<Vec<String>>,
    history_lens: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn from_responses(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses,
            cursor: Mutex::new(0),
            hints: Mutex::new(Vec::new()),
            history_lens: Mutex::new(Vec::new()),
        }
    }

    pub fn from_decisions(decisions: Vec<ActionDecision>) -> Self {
        Self::from_responses(decisions.into_iter().map(ScriptedResponse::Decision).collect())
    }

    /// Provider that returns the same decision on every call.
    pub fn repeating(decision: ActionDecision) -> Self {
        Self::from_responses(vec![ScriptedResponse::Decision(decision)])
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        *self.cursor.lock()
    }

    /// Hints the client attached to retried requests.
    pub fn hints_seen(&self) -> Vec<String> {
        self.hints.lock().clone()
    }

    /// History window sizes observed per request.
    pub fn history_lens(&self) -> Vec<usize> {
        self.history_lens.lock().clone()
    }
}

#[async_trait]
impl DecisionProvider for ScriptedProvider {
    async fn request_decision(
        &self,
        ctx: &DecisionContext,
        hint: Option<&str>,
    ) -> Result<ActionDecision, DecisionError> {
        if let Some(hint) = hint {
            self.hints.lock().push(hint.to_string());
        }
        self.history_lens.lock().push(ctx.history.len());

        let mut cursor = self.cursor.lock();
        let index = (*cursor).min(self.responses.len().saturating_sub(1));
        *cursor += 1;

        match self.responses.get(index) {
            Some(ScriptedResponse::Decision(decision)) => Ok(decision.clone()),
            Some(ScriptedResponse::Malformed(message)) => {
                Err(DecisionError::invalid(message.clone()))
            }
            None => Err(DecisionError::transport("scripted provider has no responses")),
        }
    }
}
