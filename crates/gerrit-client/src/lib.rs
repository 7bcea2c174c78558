//! Gerrit REST client for the checks plugin
//!
//! This crate provides a trait-based client for the parts of the Gerrit REST
//! API a CI connector needs: pending checks, check results, submittable
//! changes, hashtags and checker registration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              GerritClient trait                  │
//! │  - list_pending_checks()                         │
//! │  - post_check()                                  │
//! │  - list_submittable_changes() / add_hashtags()   │
//! │  - list_checkers() / post_checker()              │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!             ┌─────────────────────┐
//!             │  HttpGerritClient   │
//!             │  (reqwest + basic   │
//!             │   auth + )]}' strip)│
//!             └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gerrit_client::{BasicAuth, GerritClient, HttpGerritClient};
//! use std::time::Duration;
//!
//! # async fn example() -> gerrit_client::Result<()> {
//! let client = HttpGerritClient::new("https://gerrit.example.com/", Duration::from_secs(30))?
//!     .with_auth(BasicAuth::new("user:secret"));
//!
//! let pending = client.list_pending_checks("jarvis").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http_client;
pub mod json;
pub mod types;

#[cfg(test)]
mod test_server;

/// User agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("jarvis-connector/", env!("CARGO_PKG_VERSION"));

pub use auth::BasicAuth;
pub use client::GerritClient;
pub use error::{Error, Result};
pub use http_client::HttpGerritClient;
pub use json::{strip_xssi_prefix, unmarshal, XSSI_PREFIX};
pub use types::{
    CheckInfo, CheckInput, CheckablePatchSetInfo, CheckerInfo, CheckerInput, HashtagInput,
    PendingCheckInfo, PendingChecksInfo, SubmittableChange, Timestamp,
};
