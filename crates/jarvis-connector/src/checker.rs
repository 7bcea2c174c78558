//! Checker UUIDs and registration
//!
//! A checker UUID has the shape `<scheme>:<kind>-<sha1(repository)>`. The
//! scheme marks checkers owned by this connector, the kind names the pipeline
//! the check is dispatched to. Records that do not follow this shape belong to
//! someone else and are ignored.

use crate::error::ConnectorError;
use gerrit_client::{CheckerInfo, CheckerInput, GerritClient, PendingChecksInfo};
use log::{debug, info};
use sha1::{Digest, Sha1};
use std::sync::Arc;

const BLOCKING_NOT_PASSING: &str = "STATE_NOT_PASSING";
const CHECKER_STATUS_ENABLED: &str = "ENABLED";
const CHECKER_QUERY: &str = "status:open";

/// Derive the UUID of the checker for (scheme, prefix, repository)
///
/// Stable across calls, so registering the same triple twice targets the same
/// checker.
pub fn derive_uuid(scheme: &str, prefix: &str, repository: &str) -> String {
    let digest = Sha1::digest(repository.as_bytes());
    format!("{}:{}-{}", scheme, prefix, hex::encode(digest))
}

/// The scheme this connector owns and the checker kinds it can dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerScheme {
    scheme: String,
    kinds: Vec<String>,
}

impl CheckerScheme {
    /// Kinds must be non-empty and free of `-`, which separates kind and hash
    pub fn new(scheme: impl Into<String>, kinds: Vec<String>) -> Result<Self, ConnectorError> {
        if let Some(kind) = kinds.iter().find(|k| k.is_empty() || k.contains('-')) {
            return Err(ConnectorError::InvalidCheckerKind { kind: kind.clone() });
        }
        Ok(Self {
            scheme: scheme.into(),
            kinds,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// The kind segment of `uuid`, if the UUID is ours and the kind is known
    pub fn kind_of<'a>(&self, uuid: &'a str) -> Option<&'a str> {
        let rest = uuid.strip_prefix(self.scheme.as_str())?.strip_prefix(':')?;
        let (kind, hash) = rest.split_once('-')?;
        if hash.contains('-') || !self.is_known_kind(kind) {
            return None;
        }
        Some(kind)
    }

    pub fn owns(&self, uuid: &str) -> bool {
        self.kind_of(uuid).is_some()
    }
}

/// Lists and registers this connector's checkers
pub struct CheckerRegistry {
    gerrit: Arc<dyn GerritClient>,
    scheme: CheckerScheme,
}

impl CheckerRegistry {
    pub fn new(gerrit: Arc<dyn GerritClient>, scheme: CheckerScheme) -> Self {
        Self { gerrit, scheme }
    }

    /// All checkers of our scheme with a recognized kind, in Gerrit's order
    pub async fn list_checkers(&self) -> Result<Vec<CheckerInfo>, ConnectorError> {
        let checkers = self.gerrit.list_checkers().await?;
        let total = checkers.len();
        let ours: Vec<CheckerInfo> = checkers
            .into_iter()
            .filter(|c| self.scheme.owns(&c.uuid))
            .collect();
        debug!("{} of {} checkers belong to scheme {}", ours.len(), total, self.scheme.scheme());
        Ok(ours)
    }

    /// Create (or, with `update`, overwrite) the checker for `prefix` on `repository`
    pub async fn register(
        &self,
        repository: &str,
        prefix: &str,
        update: bool,
        blocking: bool,
    ) -> Result<CheckerInfo, ConnectorError> {
        if !self.scheme.is_known_kind(prefix) {
            return Err(ConnectorError::UnsupportedPrefix {
                prefix: prefix.to_string(),
                supported: self.scheme.kinds().to_vec(),
            });
        }

        let input = checker_input(self.scheme.scheme(), prefix, repository, blocking);
        info!(
            "{} checker {} for {}",
            if update { "Updating" } else { "Creating" },
            input.uuid,
            repository
        );

        let target = update.then_some(input.uuid.as_str());
        Ok(self.gerrit.post_checker(target, &input).await?)
    }

    /// Pending checks for one of our checkers
    pub async fn pending_checks(
        &self,
        checker_uuid: &str,
    ) -> Result<Vec<PendingChecksInfo>, ConnectorError> {
        if !self.scheme.owns(checker_uuid) {
            return Err(ConnectorError::UnknownCheckerKind {
                uuid: checker_uuid.to_string(),
            });
        }
        Ok(self.gerrit.pending_checks_for_checker(checker_uuid).await?)
    }
}

fn checker_input(scheme: &str, prefix: &str, repository: &str, blocking: bool) -> CheckerInput {
    let blocking = if blocking {
        vec![BLOCKING_NOT_PASSING.to_string()]
    } else {
        Vec::new()
    };

    CheckerInput {
        uuid: derive_uuid(scheme, prefix, repository),
        name: prefix.to_string(),
        description: format!("Dispatches {prefix} checks to the CI pipeline."),
        url: String::new(),
        repository: repository.to_string(),
        status: CHECKER_STATUS_ENABLED.to_string(),
        blocking,
        query: CHECKER_QUERY.to_string(),
    }
}
