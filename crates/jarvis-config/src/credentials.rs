//! Gerrit credential resolution
//!
//! Tries, in order:
//! 1. `JARVIS_GERRIT_AUTH` env var (`user:secret`)
//! 2. The `auth_file` named in the config
//!
//! No credential at all is not an error: anonymous access works against
//! Gerrit instances that allow it, though `a/` endpoints will then answer 401.

use crate::AppConfig;
use anyhow::{Context, Result};
use log::debug;

/// Env var holding `user:secret`
pub const AUTH_ENV_VAR: &str = "JARVIS_GERRIT_AUTH";

pub fn resolve_credentials(config: &AppConfig) -> Result<Option<String>> {
    if let Ok(auth) = std::env::var(AUTH_ENV_VAR) {
        if !auth.trim().is_empty() {
            debug!("Using Gerrit credentials from {}", AUTH_ENV_VAR);
            return Ok(Some(auth));
        }
    }

    match &config.auth_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read auth file {}", path))?;
            debug!("Using Gerrit credentials from {}", path);
            Ok(Some(content))
        }
        None => Ok(None),
    }
}
