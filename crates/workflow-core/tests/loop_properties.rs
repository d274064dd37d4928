//! End-to-end loop behavior against the scriptable driver and provider.

use std::sync::Arc;

use decision_client::{ActionDecision, ScriptedProvider, ScriptedResponse};
use driver_adapter::{
    BoundingBox, DriverErrorKind, ElementDescriptor, StubDriver, StubPage,
};
use workflow_core::{
    MemorySink, TerminalStatus, WorkflowConfig, WorkflowOrchestrator, WorkflowRequest,
};

fn button(selector: &str, text: &str) -> ElementDescriptor {
    ElementDescriptor {
        selector: selector.to_string(),
        tag: "button".to_string(),
        role: None,
        text: text.to_string(),
        bounds: BoundingBox::new(0.0, 0.0, 60.0, 24.0),
        visible: true,
        field_kind: None,
    }
}

fn request() -> WorkflowRequest {
    WorkflowRequest {
        app: "demo".to_string(),
        task: "press the button".to_string(),
        starting_url: "https://demo.example/start".to_string(),
    }
}

fn harness(
    driver: StubDriver,
    provider: ScriptedProvider,
    cfg: WorkflowConfig,
) -> (
    WorkflowOrchestrator<Arc<ScriptedProvider>>,
    Arc<ScriptedProvider>,
    Arc<MemorySink>,
    Arc<StubDriver>,
) {
    let driver = Arc::new(driver);
    let provider = Arc::new(provider);
    let sink = Arc::new(MemorySink::new());
    let orchestrator = WorkflowOrchestrator::new(
        driver.clone() as Arc<dyn driver_adapter::BrowserDriver>,
        provider.clone(),
        sink.clone() as Arc<dyn workflow_core::DatasetSink>,
        cfg,
    );
    (orchestrator, provider, sink, driver)
}

#[tokio::test]
async fn immediate_done_captures_only_the_initial_state() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, provider, sink, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::repeating(ActionDecision::done(true)),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Succeeded);
    assert!(run.goal_achieved);
    assert_eq!(run.state_count(), 1);
    assert!(run.states[0].trigger.is_none());
    assert!(run.indices_are_contiguous());
    assert_eq!(provider.calls(), 1);
    assert_eq!(sink.states().len(), 1);
    assert_eq!(sink.runs().len(), 1);
}

#[tokio::test]
async fn done_without_goal_is_failed_but_complete() {
    let page = StubPage::new("https://demo.example/start");
    let (orchestrator, _, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::repeating(ActionDecision::done(false)),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;
    assert_eq!(run.status, TerminalStatus::Failed);
    assert!(!run.goal_achieved);
    assert!(run.error.is_some());
}

#[tokio::test]
async fn iteration_budget_terminates_after_exactly_one_cycle() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, provider, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::repeating(ActionDecision::click("#go")),
        WorkflowConfig::minimal().max_iterations(1),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::MaxIterations);
    assert_eq!(provider.calls(), 1, "exactly one decision/action cycle");
    assert!(run.error.is_some());
    // The static page never changed, so only the initial capture exists.
    assert_eq!(run.state_count(), 1);
}

#[tokio::test]
async fn unresolvable_selector_fails_after_three_consecutive_misses() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, provider, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::repeating(ActionDecision::click("#missing")),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Failed);
    assert_eq!(provider.calls(), 3);
    assert!(run.error.as_deref().unwrap_or("").contains("#missing"));
    // The run survived the first two misses without crashing.
    assert_eq!(run.state_count(), 1);
}

#[tokio::test]
async fn malformed_decision_is_absorbed_by_one_retry() {
    let page = StubPage::new("https://demo.example/start");
    let (orchestrator, provider, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::from_responses(vec![
            ScriptedResponse::Malformed("no action field".to_string()),
            ScriptedResponse::Decision(ActionDecision::done(true)),
        ]),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Succeeded);
    assert_eq!(provider.calls(), 2);
    assert_eq!(provider.hints_seen().len(), 1);
    assert_eq!(run.state_count(), 1, "no state lost to the retry");
}

#[tokio::test]
async fn two_consecutive_malformed_decisions_end_the_run_as_error() {
    let page = StubPage::new("https://demo.example/start");
    let (orchestrator, _, sink, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::from_responses(vec![
            ScriptedResponse::Malformed("bad".to_string()),
            ScriptedResponse::Malformed("still bad".to_string()),
        ]),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Error);
    assert!(run.error.is_some());
    // Partial progress is preserved and the summary still reaches the sink.
    assert_eq!(run.state_count(), 1);
    assert_eq!(sink.runs().len(), 1);
}

#[tokio::test]
async fn page_change_is_captured_with_the_triggering_decision() {
    let pages = vec![
        StubPage::new("https://demo.example/start").with_element(button("#go", "Go")),
        StubPage::new("https://demo.example/next").with_element(button("#finish", "Finish")),
    ];
    let (orchestrator, _, sink, _) = harness(
        StubDriver::with_pages(pages).advance_on_action(true),
        ScriptedProvider::from_decisions(vec![
            ActionDecision::click("#go"),
            ActionDecision::done(true),
        ]),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Succeeded);
    assert_eq!(run.state_count(), 2);
    assert!(run.indices_are_contiguous());
    assert_eq!(run.states[1].url, "https://demo.example/next");
    let trigger = run.states[1].trigger.as_ref().expect("trigger present");
    assert_eq!(trigger.target.as_deref(), Some("#go"));

    // Sink saw the states in index order.
    let recorded: Vec<u32> = sink.states().iter().map(|s| s.index).collect();
    assert_eq!(recorded, vec![1, 2]);
}

#[tokio::test]
async fn cosmetic_noop_actions_do_not_duplicate_captures() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, _, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::from_decisions(vec![
            ActionDecision::wait(),
            ActionDecision::scroll(None),
            ActionDecision::done(true),
        ]),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Succeeded);
    assert_eq!(run.state_count(), 1, "no duplicate captures for no-ops");
}

#[tokio::test]
async fn cancellation_between_iterations_preserves_captured_states() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, _, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::repeating(ActionDecision::click("#go")),
        WorkflowConfig::minimal(),
    );

    orchestrator.cancel_token().cancel();
    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Cancelled);
    assert_eq!(run.state_count(), 1, "initial capture preserved");
}

#[tokio::test]
async fn driver_fault_ends_the_run_as_error_with_partial_states() {
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, _, sink, _) = harness(
        StubDriver::single_page(page).fail_selector("#go", DriverErrorKind::Io),
        ScriptedProvider::repeating(ActionDecision::click("#go")),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Error);
    assert!(run.error.as_deref().unwrap_or("").contains("i/o"));
    assert_eq!(run.state_count(), 1);
    assert_eq!(sink.runs().len(), 1);
}

#[tokio::test]
async fn history_records_misses_for_the_next_decision() {
    // First decision misses, second succeeds after the service "sees" the
    // failure; the provider records the history length it was given.
    let page = StubPage::new("https://demo.example/start").with_element(button("#go", "Go"));
    let (orchestrator, provider, _, _) = harness(
        StubDriver::single_page(page),
        ScriptedProvider::from_decisions(vec![
            ActionDecision::click("#missing"),
            ActionDecision::done(true),
        ]),
        WorkflowConfig::minimal(),
    );

    let run = orchestrator.run(request()).await;

    assert_eq!(run.status, TerminalStatus::Succeeded);
    let lens = provider.history_lens();
    assert_eq!(lens, vec![0, 1], "second request carries the miss");
}
