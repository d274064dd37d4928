//! Lightweight page fingerprints used for change comparison.

use driver_adapter::ElementDescriptor;
use serde::{Deserialize, Serialize};

/// Fingerprint of one page state.
///
/// Signatures exist only to be compared against the previous iteration's
/// baseline; they are never persisted. The element digests are computed
/// exclusively from role+text+selector tuples so that pixel noise and
/// volatile attributes (timestamps, animation classes) cannot flip them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSignature {
    pub url: String,

    /// Sorted per-element digests of visible interactive elements.
    pub element_digests: Vec<u64>,

    /// Whether a modal/overlay container is currently visible.
    pub overlay_present: bool,

    /// Number of visible form containers.
    pub visible_form_count: usize,
}

impl PageSignature {
    /// Build a signature from the current URL and element snapshot.
    pub fn from_page(url: impl Into<String>, elements: &[ElementDescriptor]) -> Self {
        let mut element_digests: Vec<u64> = elements
            .iter()
            .filter(|el| el.visible)
            .map(element_digest)
            .collect();
        element_digests.sort_unstable();

        let overlay_present = elements.iter().any(|el| el.visible && el.is_overlay());
        let visible_form_count = elements.iter().filter(|el| el.visible && el.is_form()).count();

        Self {
            url: url.into(),
            element_digests,
            overlay_present,
            visible_form_count,
        }
    }

    pub fn element_count(&self) -> usize {
        self.element_digests.len()
    }
}

/// Digest of a single element's role+text+selector tuple.
fn element_digest(el: &ElementDescriptor) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(el.effective_role().as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(el.text.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(el.selector.as_bytes());
    let hash = hasher.finalize();
    let mut word = [0u8; 8];
    word.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(word)
}
