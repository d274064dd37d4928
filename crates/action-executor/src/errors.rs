use decision_client::ActionKind;
use thiserror::Error;

/// Errors emitted by the action executor.
///
/// These cover decisions the executor cannot act on at all; everything that
/// happens while acting is reported through
/// [`crate::ExecutionOutcome`] instead.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A `Done` decision reached the executor; the orchestrator must
    /// terminate on `Done` before dispatching.
    #[error("action kind {0:?} is not executable")]
    NotExecutable(ActionKind),

    /// Required fields were missing despite upstream validation.
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
}
