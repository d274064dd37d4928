//! State change detection over consecutive page signatures.

use serde::{Deserialize, Serialize};

use crate::signature::PageSignature;

/// Why the detector declared (or declined) a change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    UrlChanged,
    OverlayToggled,
    FormCountChanged,
    StructuralDrift,
    WithinTolerance,
    Identical,
}

/// Outcome of a signature comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChangeVerdict {
    pub changed: bool,
    pub reason: ChangeReason,
}

impl ChangeVerdict {
    fn changed(reason: ChangeReason) -> Self {
        Self {
            changed: true,
            reason,
        }
    }

    fn unchanged(reason: ChangeReason) -> Self {
        Self {
            changed: false,
            reason,
        }
    }
}

/// How much element drift is considered cosmetic.
///
/// Drift is the symmetric difference between the two sorted digest lists.
/// A comparison is cosmetic only when the drift is at most `max_changed`
/// elements AND at most `max_ratio` of the larger element count; anything
/// beyond either bound is a structural change. The defaults absorb a
/// rotating banner or a ticking counter without swallowing a real layout
/// change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftTolerance {
    pub max_changed: usize,
    pub max_ratio: f64,
}

impl Default for DriftTolerance {
    fn default() -> Self {
        Self {
            max_changed: 2,
            max_ratio: 0.05,
        }
    }
}

/// Pure comparator over two page signatures.
///
/// Holds no mutable state; `has_changed` is a function of its two inputs
/// and the configured tolerance, so it can be tested without a browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateChangeDetector {
    tolerance: DriftTolerance,
}

impl StateChangeDetector {
    pub fn new(tolerance: DriftTolerance) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> DriftTolerance {
        self.tolerance
    }

    /// Compare the previous baseline against the current signature.
    pub fn has_changed(&self, previous: &PageSignature, current: &PageSignature) -> ChangeVerdict {
        if previous.url != current.url {
            return ChangeVerdict::changed(ChangeReason::UrlChanged);
        }
        if previous.overlay_present != current.overlay_present {
            return ChangeVerdict::changed(ChangeReason::OverlayToggled);
        }
        if previous.visible_form_count != current.visible_form_count {
            return ChangeVerdict::changed(ChangeReason::FormCountChanged);
        }

        let drift = symmetric_difference(&previous.element_digests, &current.element_digests);
        if drift == 0 {
            return ChangeVerdict::unchanged(ChangeReason::Identical);
        }

        let larger = previous.element_count().max(current.element_count()).max(1);
        let ratio = drift as f64 / larger as f64;
        if drift <= self.tolerance.max_changed && ratio <= self.tolerance.max_ratio {
            ChangeVerdict::unchanged(ChangeReason::WithinTolerance)
        } else {
            ChangeVerdict::changed(ChangeReason::StructuralDrift)
        }
    }
}

/// Size of the multiset symmetric difference of two sorted digest lists.
fn symmetric_difference(a: &[u64], b: &[u64]) -> usize {
    let mut i = 0;
    let mut j = 0;
    let mut drift = 0;
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                drift += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                drift += 1;
                j += 1;
            }
        }
    }
    drift + (a.len() - i) + (b.len() - j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_adapter::{BoundingBox, ElementDescriptor};

    fn element(selector: &str, text: &str) -> ElementDescriptor {
        ElementDescriptor {
            selector: selector.to_string(),
            tag: "button".to_string(),
            role: None,
            text: text.to_string(),
            bounds: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            visible: true,
            field_kind: None,
        }
    }

    fn signature(url: &str, selectors: &[&str]) -> PageSignature {
        let elements: Vec<ElementDescriptor> =
            selectors.iter().map(|s| element(s, s)).collect();
        PageSignature::from_page(url, &elements)
    }

    #[test]
    fn identical_signatures_never_change() {
        let sig = signature("https://x.example", &["#a", "#b", "#c"]);
        let verdict = StateChangeDetector::default().has_changed(&sig, &sig);
        assert!(!verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::Identical);
    }

    #[test]
    fn url_change_always_wins() {
        let before = signature("https://x.example", &["#a"]);
        let after = signature("https://x.example/next", &["#a"]);
        let verdict = StateChangeDetector::default().has_changed(&before, &after);
        assert!(verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::UrlChanged);
    }

    #[test]
    fn overlay_toggle_is_a_change() {
        let before = signature("https://x.example", &["#a"]);
        let mut dialog = element("#modal", "");
        dialog.role = Some("dialog".to_string());
        let after = PageSignature::from_page(
            "https://x.example",
            &[element("#a", "#a"), dialog],
        );
        let verdict = StateChangeDetector::default().has_changed(&before, &after);
        assert!(verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::OverlayToggled);
    }

    #[test]
    fn small_drift_on_large_page_is_cosmetic() {
        let selectors: Vec<String> = (0..60).map(|i| format!("#el{i}")).collect();
        let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
        let before = signature("https://x.example", &refs);

        // One element's text ticks over, everything else identical.
        let mut elements: Vec<ElementDescriptor> =
            refs.iter().map(|s| element(s, s)).collect();
        elements[0].text = "12:00:01".to_string();
        let after = PageSignature::from_page("https://x.example", &elements);

        let verdict = StateChangeDetector::default().has_changed(&before, &after);
        assert!(!verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::WithinTolerance);
    }

    #[test]
    fn large_drift_is_structural() {
        let before = signature("https://x.example", &["#a", "#b", "#c", "#d"]);
        let after = signature("https://x.example", &["#w", "#x", "#y", "#z"]);
        let verdict = StateChangeDetector::default().has_changed(&before, &after);
        assert!(verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::StructuralDrift);
    }

    #[test]
    fn drift_on_small_page_exceeds_ratio() {
        // 2 changed out of 4 is within max_changed but far over max_ratio.
        let before = signature("https://x.example", &["#a", "#b", "#c", "#d"]);
        let after = signature("https://x.example", &["#a", "#b", "#c", "#e"]);
        let verdict = StateChangeDetector::default().has_changed(&before, &after);
        assert!(verdict.changed);
        assert_eq!(verdict.reason, ChangeReason::StructuralDrift);
    }

    #[test]
    fn verdict_is_idempotent() {
        let before = signature("https://x.example", &["#a"]);
        let after = signature("https://x.example/next", &["#a"]);
        let detector = StateChangeDetector::default();
        let first = detector.has_changed(&before, &after);
        let second = detector.has_changed(&before, &after);
        assert_eq!(first, second);
    }

    #[test]
    fn symmetric_difference_handles_tails() {
        assert_eq!(symmetric_difference(&[1, 2, 3], &[1, 2, 3]), 0);
        assert_eq!(symmetric_difference(&[1, 2], &[1, 2, 3, 4]), 2);
        assert_eq!(symmetric_difference(&[], &[7]), 1);
        assert_eq!(symmetric_difference(&[1, 5], &[2, 5]), 2);
    }
}
