//! Prompt assembly for the vision decision request.
//!
//! The reasoning service receives the task, the current URL, a bounded
//! element listing, the recent action history, and the JSON response
//! contract. The screenshot travels separately as an image attachment.

use crate::types::DecisionContext;
use driver_adapter::ElementDescriptor;
use std::fmt::Write as _;

/// Upper bound on elements listed in the prompt body.
pub const MAX_PROMPT_ELEMENTS: usize = 50;

/// Truncation limit for element text in the listing.
const MAX_ELEMENT_TEXT: usize = 50;

const RESPONSE_CONTRACT: &str = r#"Return your decision as JSON with exactly this structure:
{
    "action": "click" | "type" | "scroll" | "wait" | "done",
    "target_selector": "CSS selector from the element list (required for click/type)",
    "text": "text to enter (required for type)",
    "goal_achieved": true/false,
    "confidence": 0.0-1.0,
    "reasoning": "why this action moves the task forward"
}

IMPORTANT:
- Before anything else, check whether the task is already complete; if so respond with action "done" and set goal_achieved accordingly.
- Use selectors exactly as they appear in the element list.
- If no listed element fits, prefer "scroll" or "wait" over inventing a selector.
- Return ONLY valid JSON, no other text."#;

/// Build the full prompt text for one decision request.
pub fn build_prompt(ctx: &DecisionContext, hint: Option<&str>) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are driving a web browser to accomplish a task.\n\nTASK: {}\n\nCURRENT URL: {}\n",
        ctx.task, ctx.current_url
    );

    prompt.push_str("INTERACTIVE ELEMENTS:\n");
    prompt.push_str(&format_elements(&ctx.elements));

    prompt.push_str("\nPREVIOUS ACTIONS:\n");
    if ctx.history.is_empty() {
        prompt.push_str("None\n");
    } else {
        for entry in &ctx.history {
            let _ = writeln!(prompt, "{}", entry.summary());
        }
    }

    if let Some(hint) = hint {
        let _ = writeln!(
            prompt,
            "\nNOTE: your previous response was rejected: {hint}. Correct it this time."
        );
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_CONTRACT);
    prompt
}

fn format_elements(elements: &[ElementDescriptor]) -> String {
    if elements.is_empty() {
        return "No interactive elements found.\n".to_string();
    }

    let mut out = String::new();
    for el in elements.iter().filter(|el| el.visible).take(MAX_PROMPT_ELEMENTS) {
        let text: String = el.text.chars().take(MAX_ELEMENT_TEXT).collect();
        let _ = write!(out, "- selector: {} | role: {}", el.selector, el.effective_role());
        if !text.is_empty() {
            let _ = write!(out, " | text: {text}");
        }
        if let Some(field) = &el.field_kind {
            let _ = write!(out, " | field: {field}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionDecision, HistoryEntry, HistoryOutcome};
    use driver_adapter::{BoundingBox, Screenshot};

    fn element(selector: &str) -> ElementDescriptor {
        ElementDescriptor {
            selector: selector.to_string(),
            tag: "button".to_string(),
            role: None,
            text: "Go".to_string(),
            bounds: BoundingBox::default(),
            visible: true,
            field_kind: None,
        }
    }

    fn ctx() -> DecisionContext {
        DecisionContext {
            task: "open settings".to_string(),
            current_url: "https://x.example".to_string(),
            screenshot: Screenshot::png(vec![0]),
            elements: vec![element("#go")],
            history: vec![HistoryEntry::new(
                ActionDecision::click("#menu"),
                HistoryOutcome::NotFound,
            )],
        }
    }

    #[test]
    fn test_prompt_contains_sections() {
        let prompt = build_prompt(&ctx(), None);
        assert!(prompt.contains("TASK: open settings"));
        assert!(prompt.contains("CURRENT URL: https://x.example"));
        assert!(prompt.contains("selector: #go"));
        assert!(prompt.contains("click #menu (not found)"));
        assert!(prompt.contains("Return ONLY valid JSON"));
        assert!(!prompt.contains("rejected"));
    }

    #[test]
    fn test_hint_is_appended() {
        let prompt = build_prompt(&ctx(), Some("click without selector"));
        assert!(prompt.contains("rejected: click without selector"));
    }

    #[test]
    fn test_element_cap() {
        let mut many = ctx();
        many.elements = (0..200).map(|i| element(&format!("#b{i}"))).collect();
        let prompt = build_prompt(&many, None);
        let listed = prompt.matches("- selector: ").count();
        assert_eq!(listed, MAX_PROMPT_ELEMENTS);
    }

    #[test]
    fn test_hidden_elements_not_listed() {
        let mut c = ctx();
        c.elements[0].visible = false;
        let prompt = build_prompt(&c, None);
        assert!(!prompt.contains("selector: #go"));
    }
}
