use decision_client::DecisionError;
use driver_adapter::DriverError;
use thiserror::Error;

/// Internal fault type for the orchestrator.
///
/// Nothing here ever escapes [`crate::WorkflowOrchestrator::run`]; faults
/// are converted into a terminal [`crate::WorkflowRun`] with status
/// `error` and the message preserved as the error detail.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("driver fault: {0}")]
    Driver(#[from] DriverError),

    #[error("decision fault: {0}")]
    Decision(#[from] DecisionError),

    #[error("decision request timed out")]
    DecisionTimeout,

    #[error("action execution timed out")]
    ActionTimeout,

    #[error("executor logic error: {0}")]
    Executor(String),
}
