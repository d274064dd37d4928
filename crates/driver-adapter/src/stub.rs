//! Scriptable in-memory driver used by tests and offline development.
//!
//! A [`StubDriver`] holds an ordered list of [`StubPage`]s and optionally
//! advances to the next page after each successful click/type, which is how
//! tests simulate the interface reacting to an action. Individual selectors
//! can be scripted to fail with a chosen [`DriverErrorKind`].

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::driver::BrowserDriver;
use crate::errors::{DriverError, DriverErrorKind};
use crate::model::{ElementDescriptor, EventKind, Screenshot};

use async_trait::async_trait;
use std::time::Duration;

/// One scripted page state.
#[derive(Clone, Debug)]
pub struct StubPage {
    pub url: String,
    pub elements: Vec<ElementDescriptor>,
    pub screenshot: Vec<u8>,
}

impl StubPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            elements: Vec::new(),
            screenshot: b"stub-screenshot".to_vec(),
        }
    }

    pub fn with_elements(mut self, elements: Vec<ElementDescriptor>) -> Self {
        self.elements = elements;
        self
    }

    pub fn with_element(mut self, element: ElementDescriptor) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = bytes;
        self
    }
}

#[derive(Debug, Default)]
struct StubState {
    pages: Vec<StubPage>,
    current: usize,
    opened: bool,
    closed: bool,
    advance_on_action: bool,
    fail: HashMap<String, DriverErrorKind>,
    log: Vec<String>,
}

/// Scriptable driver implementation.
#[derive(Debug, Default)]
pub struct StubDriver {
    state: Mutex<StubState>,
}

impl StubDriver {
    /// Driver with a single static page; actions never change it.
    pub fn single_page(page: StubPage) -> Self {
        Self::with_pages(vec![page])
    }

    /// Driver scripted with an ordered page sequence.
    pub fn with_pages(pages: Vec<StubPage>) -> Self {
        Self {
            state: Mutex::new(StubState {
                pages,
                ..Default::default()
            }),
        }
    }

    /// Advance to the next scripted page after each successful action.
    pub fn advance_on_action(self, flag: bool) -> Self {
        self.state.lock().advance_on_action = flag;
        self
    }

    /// Script `selector` to fail click/type with the given kind.
    pub fn fail_selector(self, selector: impl Into<String>, kind: DriverErrorKind) -> Self {
        self.state.lock().fail.insert(selector.into(), kind);
        self
    }

    /// Ordered log of the operations performed so far.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Index of the scripted page currently shown.
    pub fn page_index(&self) -> usize {
        self.state.lock().current
    }

    fn ensure_open(state: &StubState) -> Result<(), DriverError> {
        if !state.opened || state.closed {
            return Err(DriverError::new(DriverErrorKind::SessionClosed)
                .with_hint("stub driver is not open"));
        }
        Ok(())
    }

    fn advance(state: &mut StubState) {
        if state.advance_on_action && state.current + 1 < state.pages.len() {
            state.current += 1;
        }
    }

    fn scripted_failure(state: &StubState, selector: &str) -> Option<DriverError> {
        state
            .fail
            .get(selector)
            .map(|kind| DriverError::new(kind.clone()).with_hint(selector.to_string()))
    }

    fn current_page(state: &StubState) -> Result<&StubPage, DriverError> {
        state.pages.get(state.current).ok_or_else(|| {
            DriverError::new(DriverErrorKind::Internal).with_hint("stub driver has no pages")
        })
    }
}

#[async_trait]
impl BrowserDriver for StubDriver {
    async fn open(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.opened = true;
        state.closed = false;
        state.log.push("open".to_string());
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        state.log.push(format!("goto {url}"));
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<bool, DriverError> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(true)
    }

    async fn extract_elements(&self) -> Result<Vec<ElementDescriptor>, DriverError> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(Self::current_page(&state)?.elements.clone())
    }

    async fn screenshot(&self) -> Result<Screenshot, DriverError> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(Screenshot::png(Self::current_page(&state)?.screenshot.clone()))
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        if let Some(err) = Self::scripted_failure(&state, selector) {
            return Err(err);
        }
        state.log.push(format!("click {selector}"));
        Self::advance(&mut state);
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        if let Some(err) = Self::scripted_failure(&state, selector) {
            return Err(err);
        }
        state.log.push(format!("type {selector} {text}"));
        Self::advance(&mut state);
        Ok(())
    }

    async fn scroll(&self, selector: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        state.log.push(format!("scroll {selector}"));
        Ok(())
    }

    async fn dispatch_event(&self, selector: &str, kind: EventKind) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        Self::ensure_open(&state)?;
        // Direct dispatch bypasses interception, but a missing node still fails.
        if let Some(err) = Self::scripted_failure(&state, selector) {
            if err.is_target_not_found() {
                return Err(err);
            }
        }
        state.log.push(format!("dispatch {selector} {kind:?}"));
        Self::advance(&mut state);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let state = self.state.lock();
        Self::ensure_open(&state)?;
        Ok(Self::current_page(&state)?.url.clone())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.closed = true;
        state.log.push("close".to_string());
        Ok(())
    }
}
