//! Application configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::infrastructure::storage::default_storage_path;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default debounce window for search-as-you-type, in milliseconds
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL, without trailing slash
    pub api_base_url: String,
    /// Per-request timeout for the HTTP client
    pub request_timeout: Duration,
    /// File backing the durable key/value store
    pub storage_path: PathBuf,
    /// Debounce window for search-as-you-type
    pub search_debounce: Duration,
    /// Optional project scope forwarded on list/create
    pub project_id: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` (environment or test map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_url = lookup("WORLDLOOM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = Url::parse(&raw_url)
            .with_context(|| format!("WORLDLOOM_API_URL is not a valid URL: {}", raw_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("WORLDLOOM_API_URL must be http or https, got {}", parsed.scheme());
        }

        let request_timeout_ms: u64 = lookup("WORLDLOOM_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| "120000".to_string())
            .parse()
            .context("WORLDLOOM_REQUEST_TIMEOUT_MS must be a number of milliseconds")?;

        let search_debounce_ms: u64 = match lookup("WORLDLOOM_SEARCH_DEBOUNCE_MS") {
            Some(raw) => raw
                .parse()
                .context("WORLDLOOM_SEARCH_DEBOUNCE_MS must be a number of milliseconds")?,
            None => DEFAULT_SEARCH_DEBOUNCE_MS,
        };

        Ok(Self {
            api_base_url: raw_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_millis(request_timeout_ms),
            storage_path: lookup("WORLDLOOM_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_storage_path),
            search_debounce: Duration::from_millis(search_debounce_ms),
            project_id: lookup("WORLDLOOM_PROJECT_ID")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert!(config.project_id.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("WORLDLOOM_API_URL", "https://lore.example.com/"),
            ("WORLDLOOM_REQUEST_TIMEOUT_MS", "5000"),
            ("WORLDLOOM_STORAGE_PATH", "/tmp/worldloom.json"),
            ("WORLDLOOM_PROJECT_ID", " p-9 "),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "https://lore.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/worldloom.json"));
        assert_eq!(config.project_id.as_deref(), Some("p-9"));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("WORLDLOOM_API_URL", "not a url")]).is_err());
        assert!(config(&[("WORLDLOOM_API_URL", "ftp://files.example.com")]).is_err());
        assert!(config(&[("WORLDLOOM_REQUEST_TIMEOUT_MS", "soon")]).is_err());
    }
}
