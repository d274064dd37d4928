//! Workflow orchestration for flowlens.
//!
//! Owns the perceive-decide-act-detect loop: the iteration budget, the
//! explicit phase machine, terminal-state decisions, and the composition of
//! driver, decision client, action executor, change detector, and dataset
//! sink. A run never throws for ordinary task failure; it always yields a
//! [`WorkflowRun`] whose status and error detail carry the outcome.

pub mod config;
pub mod errors;
pub mod machine;
pub mod model;
pub mod orchestrator;
pub mod ports;

pub use config::WorkflowConfig;
pub use errors::WorkflowError;
pub use machine::{LoopEvent, Phase};
pub use model::{CapturedState, TerminalStatus, WorkflowRequest, WorkflowRun};
pub use orchestrator::WorkflowOrchestrator;
pub use ports::{DatasetSink, MemorySink, NullSink, SinkError};
