//! Run directory naming.

use chrono::{DateTime, Utc};

/// Longest sanitized task fragment kept in a directory name.
const MAX_TASK_FRAGMENT: usize = 50;

/// Lowercase a name component and replace anything that is not
/// alphanumeric with underscores, collapsing repeats.
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = true;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    let mut fragment = trimmed.to_string();
    fragment.truncate(MAX_TASK_FRAGMENT);
    fragment
}

/// Unique directory name for one run: app + sanitized task + timestamp.
pub fn run_dir_name(app: &str, task: &str, started_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        sanitize_component(app),
        sanitize_component(task),
        started_at.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Create a Project!"), "create_a_project");
        assert_eq!(sanitize_component("  lots   of spaces "), "lots_of_spaces");
        assert_eq!(sanitize_component("already_clean"), "already_clean");
    }

    #[test]
    fn test_sanitize_truncates_long_tasks() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_component(&long).len(), 50);
    }

    #[test]
    fn test_run_dir_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let name = run_dir_name("Linear", "Create a project", at);
        assert_eq!(name, "linear_create_a_project_20240305_143000");
    }
}
