//! Check executor
//!
//! Single consumer of the pending-check queue. For every checker UUID on a
//! pending check it walks `Unset -> Running -> {Successful | Fail | Irrelevant}`,
//! writing the Running state and the final state back to Gerrit.

use crate::checker::CheckerScheme;
use crate::error::ConnectorError;
use crate::pipeline::{CheckPayload, DispatchOutcome, Pipeline, PipelineError};
use crate::status::StatusCode;
use gerrit_client::{CheckInput, GerritClient, PendingChecksInfo, Timestamp};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message posted with the Running state
pub const DISPATCH_STARTING: &str = "dispatch starting";

/// Gerrit rejects longer check messages
pub const MAX_MESSAGE_CHARS: usize = 1000;
const ELLIPSIS: &str = "...";

/// Cut `message` to at most [`MAX_MESSAGE_CHARS`] characters, ending in `...` when cut
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message.to_string();
    }
    let keep = MAX_MESSAGE_CHARS - ELLIPSIS.len();
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Final state of one checker on one patchset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: StatusCode,
    pub message: String,
    pub url: String,
}

/// Classify the pipeline's answer to a check dispatch
pub fn classify(result: Result<DispatchOutcome, PipelineError>) -> Verdict {
    match result {
        Ok(DispatchOutcome::Irrelevant) => Verdict {
            status: StatusCode::Irrelevant,
            message: String::new(),
            url: String::new(),
        },
        Ok(DispatchOutcome::Accepted {
            messages,
            details_url,
        }) => {
            let status = if messages.is_empty() {
                StatusCode::Fail
            } else {
                StatusCode::Successful
            };
            Verdict {
                status,
                message: truncate_message(&messages.join(", ")),
                url: details_url,
            }
        }
        Err(e) => Verdict {
            status: StatusCode::Fail,
            message: truncate_message(&format!("dispatch failed: {e}")),
            url: String::new(),
        },
    }
}

pub struct CheckExecutor {
    gerrit: Arc<dyn GerritClient>,
    pipeline: Arc<dyn Pipeline>,
    scheme: CheckerScheme,
    repo_root: String,
}

impl CheckExecutor {
    pub fn new(
        gerrit: Arc<dyn GerritClient>,
        pipeline: Arc<dyn Pipeline>,
        scheme: CheckerScheme,
        repo_root: impl Into<String>,
    ) -> Self {
        Self {
            gerrit,
            pipeline,
            scheme,
            repo_root: repo_root.into(),
        }
    }

    /// Drain `queue` one pending check at a time until every sender is gone
    pub async fn run(self, mut queue: mpsc::Receiver<PendingChecksInfo>) {
        info!("Check executor started");
        while let Some(pending) = queue.recv().await {
            if let Err(e) = self.execute_check(&pending).await {
                error!("execute_check({}): {}", pending.patch_set, e);
            }
        }
        info!("Check executor stopped");
    }

    /// Run every checker of `pending` through the state machine, in order
    ///
    /// A failed write-back or an unknown checker kind aborts the remaining
    /// checkers; the unknown kind only after its Running state was posted.
    /// A failed dispatch does not abort: it is reported as `FAILED`.
    pub async fn execute_check(&self, pending: &PendingChecksInfo) -> Result<(), ConnectorError> {
        info!("checking {}", pending.patch_set);

        let change_id = pending.patch_set.change_number.to_string();
        let patchset_id = pending.patch_set.patch_set_id;

        for uuid in pending.checker_uuids() {
            let running = CheckInput {
                checker_uuid: uuid.to_string(),
                state: StatusCode::Running.to_string(),
                message: DISPATCH_STARTING.to_string(),
                url: String::new(),
                started: Some(Timestamp::now()),
            };
            self.gerrit.post_check(&change_id, patchset_id, &running).await?;
            debug!("posted {}", running);

            // An unknown kind leaves the check at SCHEDULED until the
            // registry is fixed and the checker is re-registered.
            let kind = self
                .scheme
                .kind_of(uuid)
                .ok_or_else(|| ConnectorError::UnknownCheckerKind {
                    uuid: uuid.to_string(),
                })?;

            let payload = CheckPayload {
                repo_root: self.repo_root.clone(),
                project: pending.patch_set.repository.clone(),
                change_number: change_id.clone(),
                patch_set_number: patchset_id,
                checker_uuid: uuid.to_string(),
            };
            let result = self.pipeline.dispatch_check(&payload).await;
            match &result {
                Err(e) => warn!(
                    "failed in attempt to schedule check ({}, {}, {}, {:?}): {}",
                    uuid, change_id, patchset_id, kind, e
                ),
                Ok(DispatchOutcome::Accepted { messages, .. }) if messages.is_empty() => warn!(
                    "message empty for check ({}, {}, {}, {:?})",
                    uuid, change_id, patchset_id, kind
                ),
                Ok(_) => {}
            }

            let verdict = classify(result);
            debug_assert!(verdict.status.is_terminal());
            info!(
                "status {} ({:?}) for kind {} on {}",
                verdict.status, verdict.status, kind, pending.patch_set
            );

            let finished = CheckInput {
                checker_uuid: uuid.to_string(),
                state: verdict.status.to_string(),
                message: verdict.message,
                url: verdict.url,
                started: None,
            };
            self.gerrit.post_check(&change_id, patchset_id, &finished).await?;
            debug!("posted {}", finished);
        }

        Ok(())
    }
}
