//! Gerrit client trait
//!
//! This module defines the `GerritClient` trait every gateway implementation
//! satisfies. The connector only ever talks to Gerrit through it, which keeps
//! the polling and dispatch logic testable without a server.

use crate::error::Result;
use crate::types::{
    CheckInfo, CheckInput, CheckerInfo, CheckerInput, HashtagInput, PendingChecksInfo,
    SubmittableChange,
};
use async_trait::async_trait;

/// Gerrit REST gateway
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// between the poll loop and the check executor.
///
/// # Example
///
/// ```rust,ignore
/// use gerrit_client::{GerritClient, PendingChecksInfo};
///
/// async fn pending(client: &dyn GerritClient) -> gerrit_client::Result<Vec<PendingChecksInfo>> {
///     client.list_pending_checks("jarvis").await
/// }
/// ```
#[async_trait]
pub trait GerritClient: Send + Sync {
    /// Fetch the checks pending for every checker of a scheme
    ///
    /// `GET a/plugins/checks/checks.pending/?query=scheme:<scheme>`
    async fn list_pending_checks(&self, scheme: &str) -> Result<Vec<PendingChecksInfo>>;

    /// Fetch the checks pending for a single checker
    ///
    /// `GET a/plugins/checks/checks.pending/?query=checker:<uuid>`
    async fn pending_checks_for_checker(
        &self,
        checker_uuid: &str,
    ) -> Result<Vec<PendingChecksInfo>>;

    /// Post a check result onto a patchset
    ///
    /// `POST a/changes/<change_id>/revisions/<patchset_id>/checks/`
    async fn post_check(
        &self,
        change_id: &str,
        patchset_id: u32,
        input: &CheckInput,
    ) -> Result<CheckInfo>;

    // === Submission ===

    /// Fetch open changes with their submittability
    ///
    /// `GET a/changes/?o=SUBMITTABLE&q=is:open`
    async fn list_submittable_changes(&self) -> Result<Vec<SubmittableChange>>;

    /// Add and/or remove hashtags on a change
    ///
    /// `POST a/changes/<change_id>/hashtags`
    async fn add_hashtags(&self, change_id: &str, input: &HashtagInput) -> Result<()>;

    // === Checker registration ===

    /// Fetch every checker known to the checks plugin
    ///
    /// `GET a/plugins/checks/checkers/`
    async fn list_checkers(&self) -> Result<Vec<CheckerInfo>>;

    /// Create a checker, or update the one named by `uuid`
    ///
    /// `POST a/plugins/checks/checkers/[<uuid>]`
    async fn post_checker(&self, uuid: Option<&str>, input: &CheckerInput)
        -> Result<CheckerInfo>;
}
