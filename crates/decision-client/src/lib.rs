//! Decision service client for flowlens.
//!
//! Packages the current screenshot, element snapshot, task text, and a
//! bounded history window into a request for the external vision-reasoning
//! service, validates the structured response, and applies the
//! one-retry-with-hint policy for malformed decisions.

pub mod client;
pub mod errors;
pub mod http;
pub mod prompt;
pub mod provider;
pub mod types;
pub mod validate;

pub use client::DecisionClient;
pub use errors::DecisionError;
pub use http::{HttpVisionProvider, VisionServiceConfig};
pub use provider::{DecisionProvider, ScriptedProvider, ScriptedResponse};
pub use types::{
    ActionDecision, ActionKind, DecisionContext, HistoryEntry, HistoryOutcome,
};
pub use validate::validate_decision;
