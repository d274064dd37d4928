//! Decision model shared by the client, the executor, and the orchestrator.

use driver_adapter::{ElementDescriptor, Screenshot};
use serde::{Deserialize, Serialize};

/// Closed set of action kinds the reasoning service may request.
///
/// The executor handles every kind exhaustively; anything the service
/// invents beyond these fails to parse and is treated as a decision fault.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Type,
    Scroll,
    Wait,
    Done,
}

/// The reasoning service's structured output for one loop iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionDecision {
    pub kind: ActionKind,

    /// Target selector; required for `Click` and `Type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Text to enter; required for `Type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// With `Done`: whether the user's goal was actually achieved.
    #[serde(default)]
    pub goal_achieved: bool,

    /// Service confidence in [0, 1].
    pub confidence: f32,

    /// Free-text rationale, copied into the captured state.
    #[serde(default)]
    pub reasoning: String,
}

impl ActionDecision {
    pub fn click(target: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Click,
            target: Some(target.into()),
            text: None,
            goal_achieved: false,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    pub fn type_text(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Type,
            target: Some(target.into()),
            text: Some(text.into()),
            goal_achieved: false,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    pub fn scroll(target: Option<String>) -> Self {
        Self {
            kind: ActionKind::Scroll,
            target,
            text: None,
            goal_achieved: false,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    pub fn wait() -> Self {
        Self {
            kind: ActionKind::Wait,
            target: None,
            text: None,
            goal_achieved: false,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    pub fn done(goal_achieved: bool) -> Self {
        Self {
            kind: ActionKind::Done,
            target: None,
            text: None,
            goal_achieved,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn is_done(&self) -> bool {
        self.kind == ActionKind::Done
    }

    /// Short human-readable description used in history lines.
    pub fn describe(&self) -> String {
        match self.kind {
            ActionKind::Click => format!(
                "click {}",
                self.target.as_deref().unwrap_or("<missing target>")
            ),
            ActionKind::Type => format!(
                "type '{}' into {}",
                self.text.as_deref().unwrap_or(""),
                self.target.as_deref().unwrap_or("<missing target>")
            ),
            ActionKind::Scroll => match &self.target {
                Some(target) => format!("scroll to {target}"),
                None => "scroll page".to_string(),
            },
            ActionKind::Wait => "wait for page".to_string(),
            ActionKind::Done => {
                if self.goal_achieved {
                    "done (goal achieved)".to_string()
                } else {
                    "done (goal not achieved)".to_string()
                }
            }
        }
    }
}

/// How a past decision played out, as seen by the next request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Applied,
    AppliedViaFallback,
    NotFound,
}

/// One entry of the bounded short-term memory window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub decision: ActionDecision,
    pub outcome: HistoryOutcome,
}

impl HistoryEntry {
    pub fn new(decision: ActionDecision, outcome: HistoryOutcome) -> Self {
        Self { decision, outcome }
    }

    /// One prompt line, e.g. `- click #save (not found)`.
    pub fn summary(&self) -> String {
        let outcome = match self.outcome {
            HistoryOutcome::Applied => "ok",
            HistoryOutcome::AppliedViaFallback => "ok via fallback",
            HistoryOutcome::NotFound => "not found",
        };
        format!("- {} ({outcome})", self.decision.describe())
    }
}

/// Everything the client needs to build one decision request.
#[derive(Clone, Debug)]
pub struct DecisionContext {
    pub task: String,
    pub current_url: String,
    pub screenshot: Screenshot,
    pub elements: Vec<ElementDescriptor>,
    pub history: Vec<HistoryEntry>,
}
