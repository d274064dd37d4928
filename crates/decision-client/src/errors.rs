use thiserror::Error;

/// Errors emitted by the decision client.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The service's response could not be parsed into a schema-valid
    /// decision. Transient: the client retries once with a hint.
    #[error("invalid decision response: {0}")]
    InvalidResponse(String),

    /// Two consecutive responses failed validation; escalated to the
    /// orchestrator as an infrastructure fault.
    #[error("decision service returned malformed output twice: {last}")]
    Malformed { last: String },

    /// The service could not be reached at all. The core does not retry
    /// transport failures; any retry policy belongs to the collaborator.
    #[error("decision service unreachable: {0}")]
    Transport(String),
}

impl DecisionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Whether the client may retry the request once with a hint.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}
