//! Built-in offline scenario: a newsletter subscription flow driven
//! entirely by the stub driver and a scripted decision provider.
//!
//! Useful for exercising the full loop (and the dataset layout) without a
//! browser or a reasoning service.

use decision_client::{ActionDecision, ScriptedProvider};
use driver_adapter::{BoundingBox, ElementDescriptor, StubDriver, StubPage};
use workflow_core::WorkflowRequest;

fn element(selector: &str, tag: &str, text: &str, field_kind: Option<&str>) -> ElementDescriptor {
    ElementDescriptor {
        selector: selector.to_string(),
        tag: tag.to_string(),
        role: None,
        text: text.to_string(),
        bounds: BoundingBox::new(40.0, 80.0, 200.0, 32.0),
        visible: true,
        field_kind: field_kind.map(str::to_string),
    }
}

pub fn demo_request() -> WorkflowRequest {
    WorkflowRequest {
        app: "newsletter".to_string(),
        task: "subscribe to the weekly newsletter".to_string(),
        starting_url: "https://news.example/home".to_string(),
    }
}

/// Scripted pages: landing, empty form, filled form, confirmation. The
/// driver advances one page per successful action.
pub fn demo_driver() -> StubDriver {
    let landing = StubPage::new("https://news.example/home")
        .with_element(element("#subscribe-link", "a", "Subscribe", None))
        .with_element(element("#headline", "a", "Today's headlines", None));

    let form = StubPage::new("https://news.example/subscribe")
        .with_element(element("form#signup", "form", "", None))
        .with_element(element("#email", "input", "", Some("email")))
        .with_element(element("#submit", "button", "Sign up", None));

    let form_filled = StubPage::new("https://news.example/subscribe")
        .with_element(element("form#signup", "form", "", None))
        .with_element(element("#email", "input", "reader@example.com", Some("email")))
        .with_element(element("#submit", "button", "Sign up", None));

    let confirmed = StubPage::new("https://news.example/subscribed")
        .with_element(element("#confirmation", "a", "You are subscribed!", None));

    StubDriver::with_pages(vec![landing, form, form_filled, confirmed]).advance_on_action(true)
}

/// Decisions matching the scripted pages, ending in an achieved goal.
pub fn demo_provider() -> ScriptedProvider {
    ScriptedProvider::from_decisions(vec![
        ActionDecision::click("#subscribe-link")
            .with_confidence(0.95)
            .with_reasoning("the subscribe link leads to the signup form"),
        ActionDecision::type_text("#email", "reader@example.com")
            .with_confidence(0.9)
            .with_reasoning("fill in the email field"),
        ActionDecision::click("#submit")
            .with_confidence(0.92)
            .with_reasoning("submit the signup form"),
        ActionDecision::done(true)
            .with_confidence(0.97)
            .with_reasoning("confirmation message is visible"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use workflow_core::{
        MemorySink, TerminalStatus, WorkflowConfig, WorkflowOrchestrator,
    };

    #[tokio::test]
    async fn test_demo_scenario_succeeds_end_to_end() {
        let sink = Arc::new(MemorySink::new());
        let orchestrator = WorkflowOrchestrator::new(
            Arc::new(demo_driver()),
            demo_provider(),
            sink.clone() as Arc<dyn workflow_core::DatasetSink>,
            WorkflowConfig::minimal(),
        );

        let run = orchestrator.run(demo_request()).await;

        assert_eq!(run.status, TerminalStatus::Succeeded);
        assert!(run.goal_achieved);
        assert!(run.indices_are_contiguous());
        // Initial capture plus one per page transition.
        assert_eq!(run.state_count(), 4);
        assert_eq!(sink.runs().len(), 1);
    }
}
