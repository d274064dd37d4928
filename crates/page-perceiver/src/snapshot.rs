//! Structural snapshots persisted alongside each captured state.

use chrono::{DateTime, Utc};
use driver_adapter::ElementDescriptor;
use serde::{Deserialize, Serialize};

/// The role+text+selector tuple recorded for one interactive element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementTuple {
    pub selector: String,
    pub role: String,
    #[serde(default)]
    pub text: String,
}

/// Structural record of a page at capture time.
///
/// Unlike [`crate::PageSignature`], which lives only in memory for
/// comparison, the snapshot is handed to the dataset sink and written next
/// to the screenshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuralSnapshot {
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub element_count: usize,
    pub overlay_present: bool,
    pub visible_form_count: usize,
    pub elements: Vec<ElementTuple>,
}

impl StructuralSnapshot {
    pub fn from_page(url: impl Into<String>, elements: &[ElementDescriptor]) -> Self {
        let visible: Vec<&ElementDescriptor> = elements.iter().filter(|el| el.visible).collect();
        let tuples = visible
            .iter()
            .map(|el| ElementTuple {
                selector: el.selector.clone(),
                role: el.effective_role().to_string(),
                text: el.text.clone(),
            })
            .collect();
        Self {
            url: url.into(),
            captured_at: Utc::now(),
            element_count: visible.len(),
            overlay_present: visible.iter().any(|el| el.is_overlay()),
            visible_form_count: visible.iter().filter(|el| el.is_form()).count(),
            elements: tuples,
        }
    }
}
