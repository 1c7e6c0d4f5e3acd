use std::time::Duration;

use anyhow::{Context, Result};

use crate::workflow_client::WorkflowConfig;

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Absent → workflow-backed features fall back to local heuristics.
    pub workflow_base_url: Option<String>,
    pub workflow_api_key: Option<String>,
    pub workflow_max_retries: u32,
    pub workflow_backoff_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            workflow_base_url: optional_env("WORKFLOW_BASE_URL"),
            workflow_api_key: optional_env("WORKFLOW_API_KEY"),
            workflow_max_retries: parse_env("WORKFLOW_MAX_RETRIES", 2)
                .context("WORKFLOW_MAX_RETRIES must be a non-negative integer")?,
            workflow_backoff_ms: parse_env("WORKFLOW_BACKOFF_MS", 1000)
                .context("WORKFLOW_BACKOFF_MS must be a number of milliseconds")?,
        })
    }

    /// Executor settings, or `None` when no base URL is configured.
    pub fn workflow(&self) -> Option<WorkflowConfig> {
        self.workflow_base_url.as_ref().map(|base_url| WorkflowConfig {
            base_url: base_url.clone(),
            api_key: self.workflow_api_key.clone(),
            max_retries: self.workflow_max_retries,
            backoff_base: Duration::from_millis(self.workflow_backoff_ms),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for environment variable '{key}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: Option<&str>) -> Config {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            workflow_base_url: base_url.map(str::to_string),
            workflow_api_key: Some("secret".to_string()),
            workflow_max_retries: 2,
            workflow_backoff_ms: 1000,
        }
    }

    #[test]
    fn test_workflow_config_requires_base_url() {
        assert!(config(None).workflow().is_none());

        let workflow = config(Some("http://n8n.local")).workflow().unwrap();
        assert_eq!(workflow.base_url, "http://n8n.local");
        assert_eq!(workflow.api_key.as_deref(), Some("secret"));
        assert_eq!(workflow.max_retries, 2);
        assert_eq!(workflow.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u32 = parse_env("ATS_API_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
