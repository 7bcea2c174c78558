//! Application configuration
//!
//! Configuration loaded from `.jarvis-connector.toml`. Every field has a
//! default, so a partial file (or none at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from .jarvis-connector.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Gerrit base URL (e.g. "https://gerrit.example.com/")
    #[serde(default = "default_gerrit_url")]
    pub gerrit_url: String,

    /// File holding "user:secret" for basic auth
    #[serde(default)]
    pub auth_file: Option<String>,

    /// User-Agent header sent to Gerrit
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Ask Gerrit to trace every request
    #[serde(default)]
    pub debug: bool,

    /// Checker scheme this connector owns (UUIDs look like "<scheme>:<kind>-<sha1>")
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Checker kinds this connector knows how to dispatch
    #[serde(default = "default_checker_kinds")]
    pub checker_kinds: Vec<String>,

    /// CI event listener receiving check and merge webhooks
    #[serde(default = "default_event_listener_url")]
    pub event_listener_url: String,

    /// Repository root announced to the CI pipeline (defaults to gerrit_url)
    #[serde(default)]
    pub repo_root: Option<String>,

    /// Hashtag marking a change whose merge pipeline was triggered
    #[serde(default = "default_merge_hashtag")]
    pub merge_hashtag: String,

    /// Seconds between two polls of Gerrit
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pending checks buffered between the poll loop and the executor
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Timeout for every HTTP call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Consecutive failed polls tolerated before giving up
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Initial delay before restarting the poll loop, doubled on every failure
    #[serde(default = "default_restart_backoff_secs")]
    pub restart_backoff_secs: u64,
}

fn default_gerrit_url() -> String {
    "http://gerrit.jarvis.local/".to_string()
}

fn default_user_agent() -> String {
    "jarvis-connector".to_string()
}

fn default_scheme() -> String {
    "jarvis".to_string()
}

fn default_checker_kinds() -> Vec<String> {
    vec!["jarvispipeline".to_string()]
}

fn default_event_listener_url() -> String {
    "http://el-jarvis-system.jarvis-system.svc.cluster.local:8080/".to_string()
}

fn default_merge_hashtag() -> String {
    "jarvis-merge".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_restarts() -> u32 {
    5
}

fn default_restart_backoff_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gerrit_url: default_gerrit_url(),
            auth_file: None,
            user_agent: default_user_agent(),
            debug: false,
            scheme: default_scheme(),
            checker_kinds: default_checker_kinds(),
            event_listener_url: default_event_listener_url(),
            repo_root: None,
            merge_hashtag: default_merge_hashtag(),
            poll_interval_secs: default_poll_interval_secs(),
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            max_restarts: default_max_restarts(),
            restart_backoff_secs: default_restart_backoff_secs(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then the config directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// Load config from an explicit path; unlike `load`, a bad file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn restart_backoff(&self) -> Duration {
        Duration::from_secs(self.restart_backoff_secs)
    }

    /// Repository root sent in webhook payloads
    pub fn repo_root(&self) -> &str {
        self.repo_root.as_deref().unwrap_or(&self.gerrit_url)
    }
}
