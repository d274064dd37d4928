//! Outbound ports consumed by the orchestrator.

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use flowlens_core_types::RunId;

use crate::model::{CapturedState, WorkflowRun};

/// Errors surfaced by a dataset sink.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receiver of captured states and the final run record.
///
/// The orchestrator guarantees `record_state` is called once per captured
/// state, in index order, and `record_run` exactly once with the frozen
/// run. Sink failures are logged, never fatal to the run.
#[async_trait]
pub trait DatasetSink: Send + Sync {
    async fn record_state(&self, run_id: &RunId, state: &CapturedState) -> Result<(), SinkError>;

    async fn record_run(&self, run: &WorkflowRun) -> Result<(), SinkError>;
}

/// Sink that drops everything. Useful when only the returned
/// [`WorkflowRun`] matters.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl DatasetSink for NullSink {
    async fn record_state(&self, _run_id: &RunId, _state: &CapturedState) -> Result<(), SinkError> {
        Ok(())
    }

    async fn record_run(&self, _run: &WorkflowRun) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory sink for tests; remembers everything it was handed.
#[derive(Debug, Default)]
pub struct MemorySink {
    states: Mutex<Vec<CapturedState>>,
    runs: Mutex<Vec<WorkflowRun>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<CapturedState> {
        self.states.lock().clone()
    }

    pub fn runs(&self) -> Vec<WorkflowRun> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl DatasetSink for MemorySink {
    async fn record_state(&self, _run_id: &RunId, state: &CapturedState) -> Result<(), SinkError> {
        self.states.lock().push(state.clone());
        Ok(())
    }

    async fn record_run(&self, run: &WorkflowRun) -> Result<(), SinkError> {
        self.runs.lock().push(run.clone());
        Ok(())
    }
}
