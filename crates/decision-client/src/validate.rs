//! Schema validation for decisions returned by the reasoning service.

use crate::errors::DecisionError;
use crate::types::{ActionDecision, ActionKind};

/// Check a parsed decision against the per-kind field requirements.
///
/// A violation is a transient decision fault: the caller retries once with
/// the returned message appended to the request as a hint.
pub fn validate_decision(decision: &ActionDecision) -> Result<(), DecisionError> {
    match decision.kind {
        ActionKind::Click => {
            require_target(decision, "click")?;
        }
        ActionKind::Type => {
            require_target(decision, "type")?;
            if decision.text.as_deref().map(str::is_empty).unwrap_or(true) {
                return Err(DecisionError::invalid(
                    "type action requires a non-empty text value",
                ));
            }
        }
        ActionKind::Scroll | ActionKind::Wait | ActionKind::Done => {}
    }

    if !(0.0..=1.0).contains(&decision.confidence) {
        return Err(DecisionError::invalid(format!(
            "confidence {} is outside [0, 1]",
            decision.confidence
        )));
    }

    Ok(())
}

fn require_target(decision: &ActionDecision, kind: &str) -> Result<(), DecisionError> {
    match decision.target.as_deref() {
        Some(target) if !target.trim().is_empty() => Ok(()),
        _ => Err(DecisionError::invalid(format!(
            "{kind} action requires a target selector"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_without_target_is_invalid() {
        let mut decision = ActionDecision::click("#go");
        decision.target = None;
        let err = validate_decision(&decision).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_type_requires_text() {
        let mut decision = ActionDecision::type_text("#q", "hello");
        assert!(validate_decision(&decision).is_ok());
        decision.text = Some(String::new());
        assert!(validate_decision(&decision).is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        let decision = ActionDecision::wait().with_confidence(1.5);
        assert!(validate_decision(&decision).is_err());
        let decision = ActionDecision::wait().with_confidence(0.0);
        assert!(validate_decision(&decision).is_ok());
    }

    #[test]
    fn test_done_needs_no_target() {
        assert!(validate_decision(&ActionDecision::done(true)).is_ok());
    }

    #[test]
    fn test_blank_target_is_invalid() {
        let decision = ActionDecision::click("   ");
        assert!(validate_decision(&decision).is_err());
    }
}
