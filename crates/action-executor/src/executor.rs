//! Decision execution with fallback chain orchestration.

use std::sync::Arc;
use std::time::Duration;

use decision_client::{ActionDecision, ActionKind};
use driver_adapter::{BrowserDriver, DriverError, ElementDescriptor, EventKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ExecutorError;
use crate::resolver::{closest_by_role_and_text, find_exact};

/// Fixed ceiling for `Wait` actions. Deliberately not configurable: a wait
/// decision may never stall an iteration longer than this.
const WAIT_CEILING: Duration = Duration::from_secs(2);

/// Which fallback strategy ended up applying the action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Stale selector re-resolved by role + closest visible text.
    RoleAndText,
    /// Pointer-intercepted click replaced by direct event dispatch.
    DirectDispatch,
}

/// Classification of one execution attempt.
#[derive(Clone, Debug)]
pub enum ExecutionOutcome {
    /// The primary selector worked as-is.
    AppliedClean,
    /// A fallback strategy was needed but the action landed.
    AppliedViaFallback(FallbackStrategy),
    /// Every resolution strategy was exhausted. Non-fatal; the next
    /// decision request sees this in history.
    NotFound,
    /// The browser itself failed; the orchestrator treats this as an
    /// infrastructure fault.
    Fault(DriverError),
}

impl ExecutionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::AppliedClean | Self::AppliedViaFallback(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// Executor tuning knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Selector used for target-less scroll decisions.
    pub page_scroll_selector: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            page_scroll_selector: "body".to_string(),
        }
    }
}

/// Translates decisions into driver operations.
pub struct ActionExecutor {
    driver: Arc<dyn BrowserDriver>,
    cfg: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            cfg: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: ExecutorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Perform one decision against the current page.
    ///
    /// `elements` is the snapshot the decision was made from; it is the
    /// candidate set for exact resolution, and the source of the intended
    /// role/text when the live DOM has drifted since extraction.
    pub async fn execute(
        &self,
        decision: &ActionDecision,
        elements: &[ElementDescriptor],
    ) -> Result<ExecutionOutcome, ExecutorError> {
        match decision.kind {
            ActionKind::Done => Err(ExecutorError::NotExecutable(ActionKind::Done)),
            ActionKind::Wait => {
                tokio::time::sleep(WAIT_CEILING).await;
                Ok(ExecutionOutcome::AppliedClean)
            }
            ActionKind::Scroll => Ok(self.scroll(decision, elements).await),
            ActionKind::Click => {
                let target = required_target(decision)?;
                Ok(self.click_with_fallback(target, elements).await)
            }
            ActionKind::Type => {
                let target = required_target(decision)?;
                let text = decision.text.as_deref().ok_or_else(|| {
                    ExecutorError::InvalidDecision("type decision without text".to_string())
                })?;
                Ok(self.type_with_fallback(target, text, elements).await)
            }
        }
    }

    async fn scroll(
        &self,
        decision: &ActionDecision,
        elements: &[ElementDescriptor],
    ) -> ExecutionOutcome {
        let selector = match decision.target.as_deref() {
            Some(target) => {
                if find_exact(target, elements).is_none() {
                    return ExecutionOutcome::NotFound;
                }
                target
            }
            None => self.cfg.page_scroll_selector.as_str(),
        };
        match self.driver.scroll(selector).await {
            Ok(()) => ExecutionOutcome::AppliedClean,
            Err(err) if err.is_target_not_found() => ExecutionOutcome::NotFound,
            Err(err) => ExecutionOutcome::Fault(err),
        }
    }

    async fn click_with_fallback(
        &self,
        target: &str,
        elements: &[ElementDescriptor],
    ) -> ExecutionOutcome {
        let Some(intended) = find_exact(target, elements) else {
            debug!(target, "selector absent from snapshot, nothing to resolve");
            return ExecutionOutcome::NotFound;
        };

        match self.driver.click(target).await {
            Ok(()) => ExecutionOutcome::AppliedClean,
            Err(err) if err.is_target_not_found() => {
                self.retry_click_by_role_and_text(intended).await
            }
            Err(err) if err.is_click_intercepted() => {
                self.dispatch_click(target, FallbackStrategy::DirectDispatch).await
            }
            Err(err) => ExecutionOutcome::Fault(err),
        }
    }

    /// Stage (b): the selector went stale between extraction and now.
    async fn retry_click_by_role_and_text(&self, intended: &ElementDescriptor) -> ExecutionOutcome {
        let fresh = match self.driver.extract_elements().await {
            Ok(fresh) => fresh,
            Err(err) => return ExecutionOutcome::Fault(err),
        };
        let Some(candidate) =
            closest_by_role_and_text(intended.effective_role(), &intended.text, &fresh)
        else {
            return ExecutionOutcome::NotFound;
        };

        debug!(
            stale = %intended.selector,
            resolved = %candidate.selector,
            "re-resolved stale selector by role and text"
        );
        match self.driver.click(&candidate.selector).await {
            Ok(()) => ExecutionOutcome::AppliedViaFallback(FallbackStrategy::RoleAndText),
            Err(err) if err.is_click_intercepted() => {
                self.dispatch_click(&candidate.selector, FallbackStrategy::RoleAndText)
                    .await
            }
            Err(err) if err.is_target_not_found() => ExecutionOutcome::NotFound,
            Err(err) => ExecutionOutcome::Fault(err),
        }
    }

    /// Stage (c): bypass pointer interception with a direct event.
    async fn dispatch_click(&self, selector: &str, via: FallbackStrategy) -> ExecutionOutcome {
        warn!(selector, "click intercepted, dispatching direct event");
        match self.driver.dispatch_event(selector, EventKind::Click).await {
            Ok(()) => ExecutionOutcome::AppliedViaFallback(via),
            Err(err) if err.is_target_not_found() => ExecutionOutcome::NotFound,
            Err(err) => ExecutionOutcome::Fault(err),
        }
    }

    async fn type_with_fallback(
        &self,
        target: &str,
        text: &str,
        elements: &[ElementDescriptor],
    ) -> ExecutionOutcome {
        let Some(intended) = find_exact(target, elements) else {
            debug!(target, "selector absent from snapshot, nothing to resolve");
            return ExecutionOutcome::NotFound;
        };

        match self.driver.type_text(target, text).await {
            Ok(()) => ExecutionOutcome::AppliedClean,
            Err(err) if err.is_target_not_found() => {
                let fresh = match self.driver.extract_elements().await {
                    Ok(fresh) => fresh,
                    Err(err) => return ExecutionOutcome::Fault(err),
                };
                let Some(candidate) =
                    closest_by_role_and_text(intended.effective_role(), &intended.text, &fresh)
                else {
                    return ExecutionOutcome::NotFound;
                };
                match self.driver.type_text(&candidate.selector, text).await {
                    Ok(()) => ExecutionOutcome::AppliedViaFallback(FallbackStrategy::RoleAndText),
                    Err(err) if err.is_target_not_found() => ExecutionOutcome::NotFound,
                    Err(err) => ExecutionOutcome::Fault(err),
                }
            }
            Err(err) => ExecutionOutcome::Fault(err),
        }
    }
}

fn required_target(decision: &ActionDecision) -> Result<&str, ExecutorError> {
    decision.target.as_deref().ok_or_else(|| {
        ExecutorError::InvalidDecision(format!("{:?} decision without target", decision.kind))
    })
}
