//! Element resolution helpers for the fallback chain.

use driver_adapter::ElementDescriptor;

/// Minimum similarity for a role+text fallback candidate to be accepted.
pub const SIMILARITY_FLOOR: f64 = 0.5;

/// Find the snapshot element an exact selector refers to.
pub fn find_exact<'a>(
    target: &str,
    elements: &'a [ElementDescriptor],
) -> Option<&'a ElementDescriptor> {
    elements.iter().find(|el| el.selector == target)
}

/// Fuzzy-match a stale element against fresh candidates: same effective
/// role, closest visible text, and at least [`SIMILARITY_FLOOR`] similar.
pub fn closest_by_role_and_text<'a>(
    role: &str,
    text: &str,
    candidates: &'a [ElementDescriptor],
) -> Option<&'a ElementDescriptor> {
    candidates
        .iter()
        .filter(|el| el.visible && el.effective_role() == role)
        .map(|el| (text_similarity(text, &el.text), el))
        .filter(|(score, _)| *score >= SIMILARITY_FLOOR)
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, el)| el)
}

/// Dice coefficient over character bigrams, case-insensitive.
///
/// Returns 1.0 for identical strings and 0.0 for disjoint ones. Two empty
/// strings are identical; one empty string matches nothing.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }
    let bigrams_a = bigrams(&a);
    let bigrams_b = bigrams(&b);
    if bigrams_a.is_empty() || bigrams_b.is_empty() {
        return 0.0;
    }

    let mut remaining = bigrams_b.clone();
    let mut matches = 0usize;
    for gram in &bigrams_a {
        if let Some(pos) = remaining.iter().position(|g| g == gram) {
            remaining.swap_remove(pos);
            matches += 1;
        }
    }
    (2.0 * matches as f64) / (bigrams_a.len() + bigrams_b.len()) as f64
}

fn bigrams(s: &str) -> Vec<[char; 2]> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| [w[0], w[1]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_adapter::BoundingBox;

    fn element(selector: &str, tag: &str, text: &str) -> ElementDescriptor {
        ElementDescriptor {
            selector: selector.to_string(),
            tag: tag.to_string(),
            role: None,
            text: text.to_string(),
            bounds: BoundingBox::default(),
            visible: true,
            field_kind: None,
        }
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(text_similarity("Save", "Save"), 1.0);
        assert_eq!(text_similarity("Save", "save"), 1.0);
        assert_eq!(text_similarity("", "Save"), 0.0);
        assert!(text_similarity("Save changes", "Save change") > 0.8);
        assert!(text_similarity("Save", "Delete") < 0.3);
    }

    #[test]
    fn test_closest_match_prefers_best_text() {
        let candidates = vec![
            element("#a", "button", "Save draft"),
            element("#b", "button", "Save changes"),
            element("#c", "a", "Save changes"),
        ];
        let found = closest_by_role_and_text("button", "Save changes", &candidates).unwrap();
        assert_eq!(found.selector, "#b");
    }

    #[test]
    fn test_role_mismatch_is_rejected() {
        let candidates = vec![element("#c", "a", "Save changes")];
        assert!(closest_by_role_and_text("button", "Save changes", &candidates).is_none());
    }

    #[test]
    fn test_similarity_floor_applies() {
        let candidates = vec![element("#a", "button", "Completely different")];
        assert!(closest_by_role_and_text("button", "Save", &candidates).is_none());
    }

    #[test]
    fn test_hidden_candidates_are_skipped() {
        let mut hidden = element("#a", "button", "Save");
        hidden.visible = false;
        assert!(closest_by_role_and_text("button", "Save", &[hidden]).is_none());
    }

    #[test]
    fn test_find_exact() {
        let elements = vec![element("#a", "button", "Save")];
        assert!(find_exact("#a", &elements).is_some());
        assert!(find_exact("#b", &elements).is_none());
    }
}
