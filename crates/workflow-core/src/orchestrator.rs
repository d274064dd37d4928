//! The workflow orchestrator: perceive, decide, act, detect, record.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use action_executor::{ActionExecutor, ExecutionOutcome};
use decision_client::{
    ActionDecision, DecisionClient, DecisionContext, DecisionProvider, HistoryEntry,
    HistoryOutcome,
};
use driver_adapter::{BrowserDriver, ElementDescriptor, Screenshot};
use flowlens_core_types::{RunId, StateIndex};
use page_perceiver::{PageSignature, StateChangeDetector, StructuralSnapshot};

use crate::config::WorkflowConfig;
use crate::errors::WorkflowError;
use crate::machine::{LoopEvent, Phase};
use crate::model::{CapturedState, TerminalStatus, WorkflowRequest, WorkflowRun};
use crate::ports::DatasetSink;

/// Terminal outcome being assembled while the loop winds down.
type Terminal = (TerminalStatus, bool, Option<String>);

/// Drives one workflow run from navigation to terminal state.
///
/// The orchestrator owns the iteration budget and all terminal-state
/// decisions. It never returns an error for task-level failure: every run
/// produces a [`WorkflowRun`], and infrastructure faults are folded into it
/// as status `error` with whatever states were captured so far.
pub struct WorkflowOrchestrator<P> {
    driver: Arc<dyn BrowserDriver>,
    client: DecisionClient<P>,
    executor: ActionExecutor,
    sink: Arc<dyn DatasetSink>,
    detector: StateChangeDetector,
    cfg: WorkflowConfig,
    cancel: CancellationToken,
}

impl<P: DecisionProvider> WorkflowOrchestrator<P> {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        provider: P,
        sink: Arc<dyn DatasetSink>,
        cfg: WorkflowConfig,
    ) -> Self {
        let client = DecisionClient::new(provider)
            .with_history_window(cfg.history_window)
            .with_low_confidence_threshold(cfg.low_confidence_threshold);
        let executor = ActionExecutor::new(driver.clone());
        let detector = StateChangeDetector::new(cfg.drift_tolerance);
        Self {
            driver,
            client,
            executor,
            sink,
            detector,
            cfg,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for cancelling this run between iterations.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.cfg
    }

    /// Execute the workflow described by `request` to its terminal state.
    pub async fn run(&self, request: WorkflowRequest) -> WorkflowRun {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(run_id = %run_id, app = %request.app, task = %request.task, "workflow run starting");

        let mut states = Vec::new();
        let (status, goal_achieved, error) = self.drive(&run_id, &request, &mut states).await;

        if let Err(err) = self.driver.close().await {
            warn!(error = %err, "driver close failed");
        }

        let run = WorkflowRun {
            run_id,
            app: request.app,
            task: request.task,
            starting_url: request.starting_url,
            states,
            status,
            goal_achieved,
            error,
            started_at,
            duration: clock.elapsed(),
        };

        if let Err(err) = self.sink.record_run(&run).await {
            error!(error = %err, "failed to record run summary");
        }

        info!(
            status = run.status.as_str(),
            states = run.state_count(),
            "workflow run finished"
        );
        run
    }

    /// The phase loop. Side effects happen per phase; the observed result
    /// feeds the pure transition function in [`crate::machine`].
    async fn drive(
        &self,
        run_id: &RunId,
        request: &WorkflowRequest,
        states: &mut Vec<CapturedState>,
    ) -> Terminal {
        let mut phase = Phase::Init;
        let mut terminal: Option<Terminal> = None;

        let mut iterations: u32 = 0;
        let mut baseline: Option<PageSignature> = None;
        let mut history: Vec<HistoryEntry> = Vec::new();
        let mut pending: Option<(ActionDecision, Vec<ElementDescriptor>)> = None;
        let mut last_executed: Option<ActionDecision> = None;
        let mut not_found_streak: Option<(String, u32)> = None;

        while !phase.is_terminal() {
            let event = match phase {
                Phase::Init => match self.launch(request).await {
                    Ok(()) => LoopEvent::Launched,
                    Err(err) => fail(&mut terminal, err),
                },

                Phase::CapturedInitial => match self.capture(run_id, states, None).await {
                    Ok(signature) => {
                        baseline = Some(signature);
                        LoopEvent::InitialCaptured
                    }
                    Err(err) => fail(&mut terminal, err),
                },

                Phase::AwaitingDecision => {
                    if self.cancel.is_cancelled() {
                        info!("cancellation requested between iterations");
                        terminal = Some((TerminalStatus::Cancelled, false, None));
                        LoopEvent::CancelRequested
                    } else if iterations >= self.cfg.max_iterations {
                        terminal = Some((
                            TerminalStatus::MaxIterations,
                            false,
                            Some(format!(
                                "iteration budget of {} exhausted before completion",
                                self.cfg.max_iterations
                            )),
                        ));
                        LoopEvent::BudgetExhausted
                    } else {
                        iterations += 1;
                        debug!(iteration = iterations, cap = self.cfg.max_iterations, "requesting decision");
                        match self.request_decision(request, &history).await {
                            Ok((decision, elements)) => {
                                pending = Some((decision, elements));
                                LoopEvent::DecisionReady
                            }
                            Err(err) => fail(&mut terminal, err),
                        }
                    }
                }

                Phase::DecisionReceived => match pending.as_ref() {
                    Some((decision, _)) if decision.is_done() => {
                        let goal = decision.goal_achieved;
                        let status = if goal {
                            TerminalStatus::Succeeded
                        } else {
                            TerminalStatus::Failed
                        };
                        let detail = (!goal)
                            .then(|| "task reported complete without achieving the goal".to_string());
                        info!(goal_achieved = goal, "done decision received");
                        terminal = Some((status, goal, detail));
                        LoopEvent::DoneDecision
                    }
                    Some(_) => LoopEvent::ActionAccepted,
                    None => fail(
                        &mut terminal,
                        WorkflowError::Executor("decision phase without a decision".to_string()),
                    ),
                },

                Phase::Executing => {
                    let Some((decision, elements)) = pending.take() else {
                        let err =
                            WorkflowError::Executor("executing phase without a decision".to_string());
                        phase = phase.advance(fail(&mut terminal, err));
                        continue;
                    };
                    match self
                        .execute_decision(&decision, &elements, &mut history, &mut not_found_streak)
                        .await
                    {
                        Ok(Some(terminal_outcome)) => {
                            terminal = Some(terminal_outcome);
                            LoopEvent::RepeatFailureLimit
                        }
                        Ok(None) => {
                            last_executed = Some(decision);
                            LoopEvent::ActionExecuted
                        }
                        Err(err) => fail(&mut terminal, err),
                    }
                }

                Phase::PostAction => {
                    tokio::time::sleep(self.cfg.settle_delay).await;
                    match self
                        .evaluate_capture(run_id, states, &mut baseline, last_executed.take())
                        .await
                    {
                        Ok(()) => LoopEvent::CaptureEvaluated,
                        Err(err) => fail(&mut terminal, err),
                    }
                }

                Phase::Done => break,
            };

            phase = phase.advance(event);
        }

        terminal.unwrap_or_else(|| {
            (
                TerminalStatus::Error,
                false,
                Some("internal: loop terminated without an outcome".to_string()),
            )
        })
    }

    /// Open the browser and reach the starting URL. A missed load signal
    /// is logged and tolerated; everything else is fatal.
    async fn launch(&self, request: &WorkflowRequest) -> Result<(), WorkflowError> {
        self.driver.open().await?;
        self.driver.goto(&request.starting_url).await?;
        let loaded = self.driver.wait_for_load(self.cfg.load_timeout).await?;
        if !loaded {
            warn!(url = %request.starting_url, "load signal missed, proceeding anyway");
        }
        Ok(())
    }

    async fn request_decision(
        &self,
        request: &WorkflowRequest,
        history: &[HistoryEntry],
    ) -> Result<(ActionDecision, Vec<ElementDescriptor>), WorkflowError> {
        let elements = self.driver.extract_elements().await?;
        let screenshot = self.driver.screenshot().await?;
        let current_url = self.driver.current_url().await?;
        debug!(elements = elements.len(), url = %current_url, "decision context assembled");

        let ctx = DecisionContext {
            task: request.task.clone(),
            current_url,
            screenshot,
            elements: elements.clone(),
            history: history.to_vec(),
        };

        let decision = timeout(self.cfg.decision_timeout, self.client.decide(ctx))
            .await
            .map_err(|_| WorkflowError::DecisionTimeout)??;
        debug!(action = ?decision.kind, confidence = decision.confidence, "decision received");
        Ok((decision, elements))
    }

    /// Run one decision through the executor and apply the outcome policy.
    ///
    /// Returns `Ok(Some(terminal))` when the not-found repeat threshold
    /// fails the run, `Ok(None)` to continue the loop.
    async fn execute_decision(
        &self,
        decision: &ActionDecision,
        elements: &[ElementDescriptor],
        history: &mut Vec<HistoryEntry>,
        not_found_streak: &mut Option<(String, u32)>,
    ) -> Result<Option<Terminal>, WorkflowError> {
        let outcome = timeout(
            self.cfg.action_timeout,
            self.executor.execute(decision, elements),
        )
        .await
        .map_err(|_| WorkflowError::ActionTimeout)?
        .map_err(|e| WorkflowError::Executor(e.to_string()))?;

        match outcome {
            ExecutionOutcome::Fault(err) => Err(WorkflowError::Driver(err)),
            ExecutionOutcome::NotFound => {
                let target = decision.target.clone().unwrap_or_default();
                let streak = match not_found_streak.take() {
                    Some((selector, count)) if selector == target => count + 1,
                    _ => 1,
                };
                warn!(target = %target, streak, "action target not found");
                history.push(HistoryEntry::new(decision.clone(), HistoryOutcome::NotFound));

                if streak >= self.cfg.max_not_found_repeats {
                    return Ok(Some((
                        TerminalStatus::Failed,
                        false,
                        Some(format!(
                            "selector '{target}' could not be resolved {streak} consecutive times"
                        )),
                    )));
                }
                *not_found_streak = Some((target, streak));
                Ok(None)
            }
            ExecutionOutcome::AppliedClean => {
                *not_found_streak = None;
                history.push(HistoryEntry::new(decision.clone(), HistoryOutcome::Applied));
                Ok(None)
            }
            ExecutionOutcome::AppliedViaFallback(strategy) => {
                debug!(?strategy, "action applied via fallback");
                *not_found_streak = None;
                history.push(HistoryEntry::new(
                    decision.clone(),
                    HistoryOutcome::AppliedViaFallback,
                ));
                Ok(None)
            }
        }
    }

    /// Compare the post-action signature with the baseline; capture a new
    /// state only when the detector declares a change.
    async fn evaluate_capture(
        &self,
        run_id: &RunId,
        states: &mut Vec<CapturedState>,
        baseline: &mut Option<PageSignature>,
        trigger: Option<ActionDecision>,
    ) -> Result<(), WorkflowError> {
        let elements = self.driver.extract_elements().await?;
        let url = self.driver.current_url().await?;
        let signature = PageSignature::from_page(&url, &elements);

        let Some(previous) = baseline.as_ref() else {
            // Baseline is set at the initial capture; reaching here without
            // one is a logic error, not a driver fault.
            return Err(WorkflowError::Executor(
                "post-action evaluation without a baseline signature".to_string(),
            ));
        };

        let verdict = self.detector.has_changed(previous, &signature);
        if !verdict.changed {
            debug!(reason = ?verdict.reason, "no meaningful change, skipping capture");
            return Ok(());
        }

        info!(reason = ?verdict.reason, "state change detected");
        let screenshot = self.driver.screenshot().await?;
        self.push_state(run_id, states, screenshot, &elements, url, trigger)
            .await;
        *baseline = Some(signature);
        Ok(())
    }

    /// Unconditional capture used for state 1.
    async fn capture(
        &self,
        run_id: &RunId,
        states: &mut Vec<CapturedState>,
        trigger: Option<ActionDecision>,
    ) -> Result<PageSignature, WorkflowError> {
        let elements = self.driver.extract_elements().await?;
        let url = self.driver.current_url().await?;
        let screenshot = self.driver.screenshot().await?;
        let signature = PageSignature::from_page(&url, &elements);
        self.push_state(run_id, states, screenshot, &elements, url, trigger)
            .await;
        Ok(signature)
    }

    async fn push_state(
        &self,
        run_id: &RunId,
        states: &mut Vec<CapturedState>,
        screenshot: Screenshot,
        elements: &[ElementDescriptor],
        url: String,
        trigger: Option<ActionDecision>,
    ) {
        let index = (states.len() + 1) as StateIndex;
        let state = CapturedState {
            index,
            captured_at: Utc::now(),
            screenshot,
            snapshot: StructuralSnapshot::from_page(&url, elements),
            url,
            trigger,
        };
        if let Err(err) = self.sink.record_state(run_id, &state).await {
            warn!(index, error = %err, "dataset sink rejected state");
        }
        info!(index, url = %state.url, "state captured");
        states.push(state);
    }
}

/// Record an infrastructure fault as the terminal outcome.
fn fail(terminal: &mut Option<Terminal>, err: WorkflowError) -> LoopEvent {
    error!(error = %err, "workflow fault");
    *terminal = Some((TerminalStatus::Error, false, Some(err.to_string())));
    LoopEvent::InfraFault
}
