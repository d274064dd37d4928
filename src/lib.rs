//! Flowlens - vision-driven browser workflow capture.
//!
//! The library surface re-exports the workspace crates the CLI wires
//! together; see `workflow-core` for the orchestration loop itself.

pub mod config;
pub mod demo;

pub use action_executor::{ActionExecutor, ExecutionOutcome};
pub use dataset_recorder::FsDatasetRecorder;
pub use decision_client::{
    ActionDecision, ActionKind, DecisionClient, HttpVisionProvider, ScriptedProvider,
    VisionServiceConfig,
};
pub use driver_adapter::{BrowserDriver, RemoteDriver, RemoteDriverConfig, StubDriver};
pub use flowlens_core_types::RunId;
pub use page_perceiver::{PageSignature, StateChangeDetector};
pub use workflow_core::{
    TerminalStatus, WorkflowConfig, WorkflowOrchestrator, WorkflowRequest, WorkflowRun,
};
