//! Notifier configuration and credential loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level notifier configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Slack Web API base, e.g. `https://slack.com/api`.
    pub api_base: String,
    /// Path to the credentials file, kept separate from the main config.
    pub credentials_path: PathBuf,
    /// Regex gating which users receive notifications at all.
    pub recipients_pattern: String,
    /// Recipient email template, e.g. `${USER}@example.com`.
    pub email_template: String,
    pub templates_path: PathBuf,
    #[serde(default)]
    pub knowledge_base_path: Option<PathBuf>,
    /// Optional outbound HTTP proxy, `host:port` or a full URL.
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl NotifierConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Bot token and proxy credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackCredentials {
    pub bot_token: String,
    #[serde(default)]
    pub proxy_user: Option<String>,
    #[serde(default)]
    pub proxy_password: Option<String>,
}

impl SlackCredentials {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}
