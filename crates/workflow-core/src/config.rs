//! Configuration for workflow runs.
//!
//! Passed explicitly into the orchestrator so concurrent runs can use
//! different budgets; nothing here is read from ambient state.

use std::time::Duration;

use page_perceiver::DriftTolerance;
use serde::{Deserialize, Serialize};

/// Tunables for one workflow run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Hard ceiling on decision/action cycles. The primary liveness
    /// guarantee; enforced even when every sub-timeout is generous.
    /// Default: 50
    pub max_iterations: u32,

    /// Budget for the initial load signal. Expiry is non-fatal.
    /// Default: 10s
    pub load_timeout: Duration,

    /// Budget per decision-service request (including the one retry).
    /// Default: 60s
    pub decision_timeout: Duration,

    /// Budget per action execution.
    /// Default: 30s
    pub action_timeout: Duration,

    /// Pause after an action before the post-action signature is read,
    /// giving the page a moment to settle.
    /// Default: 500ms
    pub settle_delay: Duration,

    /// Prior decisions included in each decision request.
    /// Default: 5
    pub history_window: usize,

    /// Confidence below this is logged and surfaced, never blocking.
    /// Default: 0.7
    pub low_confidence_threshold: f32,

    /// Consecutive not-found outcomes for the same selector before the
    /// run is failed.
    /// Default: 3
    pub max_not_found_repeats: u32,

    /// Structural drift considered cosmetic by the change detector.
    pub drift_tolerance: DriftTolerance,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            load_timeout: Duration::from_secs(10),
            decision_timeout: Duration::from_secs(60),
            action_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(500),
            history_window: 5,
            low_confidence_threshold: 0.7,
            max_not_found_repeats: 3,
            drift_tolerance: DriftTolerance::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with tight budgets for tests.
    pub fn minimal() -> Self {
        Self {
            max_iterations: 10,
            load_timeout: Duration::from_millis(100),
            decision_timeout: Duration::from_secs(5),
            action_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(0),
            history_window: 3,
            low_confidence_threshold: 0.7,
            max_not_found_repeats: 3,
            drift_tolerance: DriftTolerance::default(),
        }
    }

    /// Builder: set the iteration ceiling.
    pub fn max_iterations(mut self, cap: u32) -> Self {
        self.max_iterations = cap;
        self
    }

    /// Builder: set the history window.
    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Builder: set the post-action settle delay.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.max_iterations, 50);
        assert_eq!(cfg.history_window, 5);
        assert_eq!(cfg.max_not_found_repeats, 3);
    }

    #[test]
    fn test_builder() {
        let cfg = WorkflowConfig::new().max_iterations(7).history_window(2);
        assert_eq!(cfg.max_iterations, 7);
        assert_eq!(cfg.history_window, 2);
    }
}
