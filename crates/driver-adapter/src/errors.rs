use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by a driver implementation.
#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("driver i/o failure")]
    Io,
    #[error("target element not found")]
    TargetNotFound,
    #[error("click intercepted by another node")]
    ClickIntercepted,
    #[error("browser session closed")]
    SessionClosed,
    #[error("driver protocol error")]
    Protocol,
    #[error("internal driver error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
///
/// `retriable` tells the caller whether the same call could plausibly
/// succeed on a second attempt; the core never retries infrastructure
/// faults itself, but the flag is preserved for the collaborator that owns
/// retry policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

impl DriverError {
    pub fn new(kind: DriverErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    /// Whether the fault means the element could not be located, as
    /// opposed to the browser itself misbehaving.
    pub fn is_target_not_found(&self) -> bool {
        self.kind == DriverErrorKind::TargetNotFound
    }

    pub fn is_click_intercepted(&self) -> bool {
        self.kind == DriverErrorKind::ClickIntercepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_hint() {
        let err = DriverError::new(DriverErrorKind::TargetNotFound).with_hint("#missing");
        assert_eq!(err.to_string(), "target element not found: #missing");
        assert!(err.is_target_not_found());
        assert!(!err.retriable);
    }

    #[test]
    fn test_retriable_builder() {
        let err = DriverError::new(DriverErrorKind::Io).retriable(true);
        assert!(err.retriable);
        assert!(!err.is_target_not_found());
    }
}
