//! Known-apps registry and environment overrides.
//!
//! `apps.yaml` maps app names to their starting URLs so a caller can say
//! "linear" instead of spelling the URL out. Explicit flags beat the
//! environment, which beats the registry.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the starting URL for any app.
pub const ENV_START_URL: &str = "FLOWLENS_START_URL";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppsRegistry {
    #[serde(default)]
    apps: HashMap<String, AppEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppEntry {
    pub base_url: String,
}

impl AppsRegistry {
    /// Load the registry from a YAML file; a missing file is an empty
    /// registry, not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parsing apps registry")
    }

    pub fn base_url(&self, app: &str) -> Option<&str> {
        self.apps
            .get(&app.to_lowercase())
            .map(|entry| entry.base_url.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.apps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Pick the starting URL: explicit flag, then environment, then registry.
pub fn resolve_starting_url(
    explicit: Option<&str>,
    app: &str,
    registry: &AppsRegistry,
) -> Result<String> {
    if let Some(url) = explicit {
        return Ok(url.to_string());
    }
    if let Ok(url) = std::env::var(ENV_START_URL) {
        if !url.is_empty() {
            return Ok(url);
        }
    }
    registry
        .base_url(app)
        .map(str::to_string)
        .with_context(|| format!("no starting URL known for app '{app}'; pass --url or add it to apps.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apps:
  linear:
    base_url: https://linear.app
  notion:
    base_url: https://notion.so
"#;

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = AppsRegistry::from_yaml(SAMPLE).unwrap();
        assert_eq!(registry.base_url("Linear"), Some("https://linear.app"));
        assert_eq!(registry.base_url("unknown"), None);
        assert_eq!(registry.names(), vec!["linear", "notion"]);
    }

    #[test]
    fn test_explicit_url_wins() {
        let registry = AppsRegistry::from_yaml(SAMPLE).unwrap();
        let url = resolve_starting_url(Some("https://other.example"), "linear", &registry).unwrap();
        assert_eq!(url, "https://other.example");
    }

    #[test]
    fn test_registry_fallback_and_missing_app() {
        let registry = AppsRegistry::from_yaml(SAMPLE).unwrap();
        let url = resolve_starting_url(None, "notion", &registry).unwrap();
        assert_eq!(url, "https://notion.so");
        assert!(resolve_starting_url(None, "unknown", &registry).is_err());
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let registry = AppsRegistry::load("/definitely/not/there.yaml").unwrap();
        assert!(registry.names().is_empty());
    }
}
