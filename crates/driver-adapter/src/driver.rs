//! Trait capturing the minimal driver capability surface required by the
//! orchestration layers.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::DriverError;
use crate::model::{ElementDescriptor, EventKind, Screenshot};

/// Abstraction over a live browser session.
///
/// Every call may fail with a [`DriverError`]; the action executor and the
/// workflow orchestrator are expected to handle all of them. Implementations
/// own exactly one page context per driver instance - concurrent workflow
/// runs each construct their own driver.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Start the browser session. Must be called before any other method.
    async fn open(&self) -> Result<(), DriverError>;

    /// Navigate the page to the given URL.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait for the page's load signal (network-idle heuristic).
    ///
    /// Returns `Ok(false)` when the signal did not arrive within `timeout`;
    /// callers treat that as non-fatal and proceed with whatever the page
    /// currently shows.
    async fn wait_for_load(&self, timeout: Duration) -> Result<bool, DriverError>;

    /// Snapshot the interactive elements of the current page.
    async fn extract_elements(&self) -> Result<Vec<ElementDescriptor>, DriverError>;

    /// Capture an encoded screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Screenshot, DriverError>;

    /// Click the element addressed by `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Replace the value of the element addressed by `selector`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Scroll the viewport toward the element addressed by `selector`.
    async fn scroll(&self, selector: &str) -> Result<(), DriverError>;

    /// Dispatch a synthetic event directly on the target node, bypassing
    /// pointer interception checks.
    async fn dispatch_event(&self, selector: &str, kind: EventKind) -> Result<(), DriverError>;

    /// URL of the current page.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Tear the session down. Idempotent.
    async fn close(&self) -> Result<(), DriverError>;
}
