//! Restart policy for the poll loop
//!
//! A failed poll is retried after a pause that doubles with every consecutive
//! failure. Once `max_restarts` consecutive polls failed the loop gives up and
//! the process exits with the last error.

use jarvis_config::AppConfig;
use std::time::Duration;

/// Upper bound for a single restart pause
pub const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RestartPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_restarts: config.max_restarts,
            initial_backoff: config.restart_backoff(),
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Pause before the next attempt after `failures` consecutive failures
    pub fn backoff(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Whether `failures` consecutive failures still leave room for a restart
    pub fn allows(&self, failures: u32) -> bool {
        failures <= self.max_restarts
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
