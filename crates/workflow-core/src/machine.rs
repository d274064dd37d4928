//! Explicit phase machine for the workflow loop.
//!
//! The transition function is pure so termination and retry logic can be
//! tested without a browser or a decision service; the orchestrator
//! performs the side effects for the current phase, reports what happened
//! as a [`LoopEvent`], and advances.

use serde::{Deserialize, Serialize};

/// Phases of one workflow run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Browser opening and first navigation.
    Init,
    /// Initial page reached; unconditional first capture pending.
    CapturedInitial,
    /// Ready to ask the decision service.
    AwaitingDecision,
    /// A schema-valid decision is in hand.
    DecisionReceived,
    /// The action executor is working the decision.
    Executing,
    /// Action finished; signature comparison pending.
    PostAction,
    /// Terminal. No state is mutated after entry.
    Done,
}

/// What the orchestrator observed while working the current phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoopEvent {
    /// Browser open, navigation issued, load signal awaited.
    Launched,
    /// State 1 recorded.
    InitialCaptured,
    /// Decision client returned a valid decision.
    DecisionReady,
    /// The decision was `Done`; the run is complete.
    DoneDecision,
    /// The decision is an executable action.
    ActionAccepted,
    /// The executor finished (cleanly, via fallback, or not-found).
    ActionExecuted,
    /// Post-action signature compared; capture recorded or skipped.
    CaptureEvaluated,
    /// The iteration budget is exhausted.
    BudgetExhausted,
    /// The same selector failed resolution too many times in a row.
    RepeatFailureLimit,
    /// Cancellation was requested between iterations.
    CancelRequested,
    /// An unrecoverable infrastructure fault occurred.
    InfraFault,
}

impl Phase {
    /// Pure transition function.
    ///
    /// Terminal events (`BudgetExhausted`, `RepeatFailureLimit`,
    /// `CancelRequested`, `InfraFault`) lead to `Done` from any phase;
    /// `Done` absorbs everything. An event that does not belong to the
    /// current phase also lands in `Done`, which the orchestrator reports
    /// as an internal error rather than looping in an undefined state.
    pub fn advance(self, event: LoopEvent) -> Phase {
        use LoopEvent::*;
        use Phase::*;

        match event {
            BudgetExhausted | RepeatFailureLimit | CancelRequested | InfraFault => return Done,
            _ => {}
        }

        match (self, event) {
            (Init, Launched) => CapturedInitial,
            (CapturedInitial, InitialCaptured) => AwaitingDecision,
            (AwaitingDecision, DecisionReady) => DecisionReceived,
            (DecisionReceived, DoneDecision) => Done,
            (DecisionReceived, ActionAccepted) => Executing,
            (Executing, ActionExecuted) => PostAction,
            (PostAction, CaptureEvaluated) => AwaitingDecision,
            (Done, _) => Done,
            _ => Done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done)
    }
}
