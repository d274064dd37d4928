//! Run and state records produced by the orchestrator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use decision_client::ActionDecision;
use driver_adapter::Screenshot;
use flowlens_core_types::{RunId, StateIndex};
use page_perceiver::StructuralSnapshot;
use serde::{Deserialize, Serialize};

/// Final classification of a workflow run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    /// The service said done and the goal was achieved.
    Succeeded,
    /// Done without the goal, or the executor gave up on a selector.
    Failed,
    /// The iteration budget ran out before a done decision.
    MaxIterations,
    /// Infrastructure fault ended the run early.
    Error,
    /// Cancelled between iterations.
    Cancelled,
}

impl TerminalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalStatus::Succeeded => "succeeded",
            TerminalStatus::Failed => "failed",
            TerminalStatus::MaxIterations => "max_iterations",
            TerminalStatus::Error => "error",
            TerminalStatus::Cancelled => "cancelled",
        }
    }
}

/// Already-validated input triple supplied by the upstream task parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub app: String,
    pub task: String,
    pub starting_url: String,
}

/// One captured interface state. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapturedState {
    /// One-based, contiguous within the run.
    pub index: StateIndex,
    pub captured_at: DateTime<Utc>,
    pub screenshot: Screenshot,
    pub snapshot: StructuralSnapshot,
    pub url: String,

    /// The decision whose execution produced this state; `None` only for
    /// the initial capture.
    pub trigger: Option<ActionDecision>,
}

/// The full record of one workflow run, frozen at terminal state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub run_id: RunId,
    pub app: String,
    pub task: String,
    pub starting_url: String,
    pub states: Vec<CapturedState>,
    pub status: TerminalStatus,
    pub goal_achieved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl WorkflowRun {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_success(&self) -> bool {
        self.status == TerminalStatus::Succeeded
    }

    /// Invariant check: indices are the contiguous sequence 1..=N and the
    /// initial state has no trigger.
    pub fn indices_are_contiguous(&self) -> bool {
        self.states
            .iter()
            .enumerate()
            .all(|(i, state)| state.index == (i + 1) as StateIndex)
            && self
                .states
                .first()
                .map(|s| s.trigger.is_none())
                .unwrap_or(false)
    }
}
