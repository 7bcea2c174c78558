//! Submission handler
//!
//! Picks the changes Gerrit reports as ready to submit, marks them with the
//! merge hashtag and hands them to the merge pipeline. The hashtag is added
//! before dispatch, so a change whose dispatch was interrupted is not picked
//! again on the next poll.

use crate::error::ConnectorError;
use crate::pipeline::{MergePayload, Pipeline};
use gerrit_client::{GerritClient, HashtagInput, SubmittableChange};
use log::{debug, info};
use std::sync::Arc;

/// Changes that are mergeable, submittable and not already being merged
///
/// Returns a new vector in input order; the input is left untouched.
pub fn filter_submittable(changes: &[SubmittableChange], hashtag: &str) -> Vec<SubmittableChange> {
    changes
        .iter()
        .filter(|c| c.mergeable && c.submittable && !c.has_hashtag(hashtag))
        .cloned()
        .collect()
}

pub struct SubmissionHandler {
    gerrit: Arc<dyn GerritClient>,
    pipeline: Arc<dyn Pipeline>,
    hashtag: String,
    repo_root: String,
}

impl SubmissionHandler {
    pub fn new(
        gerrit: Arc<dyn GerritClient>,
        pipeline: Arc<dyn Pipeline>,
        hashtag: impl Into<String>,
        repo_root: impl Into<String>,
    ) -> Self {
        Self {
            gerrit,
            pipeline,
            hashtag: hashtag.into(),
            repo_root: repo_root.into(),
        }
    }

    /// Tag and dispatch every eligible change; the first failure aborts the call
    ///
    /// Returns the number of changes handed to the merge pipeline.
    pub async fn handle(&self) -> Result<usize, ConnectorError> {
        let changes = self.gerrit.list_submittable_changes().await?;
        let eligible = filter_submittable(&changes, &self.hashtag);
        debug!(
            "{} of {} open changes are ready to merge",
            eligible.len(),
            changes.len()
        );

        for change in &eligible {
            self.gerrit
                .add_hashtags(&change.change_id, &HashtagInput::add(self.hashtag.as_str()))
                .await?;

            let payload = MergePayload {
                repo_root: self.repo_root.clone(),
                project: change.project.clone(),
                change_number: change.change_id.clone(),
            };
            self.pipeline.dispatch_merge(&payload).await?;
            info!("merge pipeline triggered for {} ({})", change.change_id, change.project);
        }

        Ok(eligible.len())
    }
}
