//! Poll loop
//!
//! Producer side of the check queue. Every tick asks Gerrit for the pending
//! checks of our scheme, runs the submission handler and pushes the pending
//! checks onto the bounded queue without ever waiting for room. A check that
//! does not fit is dropped; the next tick finds it again.

use crate::error::ConnectorError;
use crate::submission::SubmissionHandler;
use crate::supervisor::RestartPolicy;
use gerrit_client::{GerritClient, PendingChecksInfo};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};

/// What a single tick did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub found: usize,
    pub enqueued: usize,
    pub dropped: usize,
    pub merges: usize,
}

pub struct PollLoop {
    gerrit: Arc<dyn GerritClient>,
    submissions: SubmissionHandler,
    scheme: String,
    interval: Duration,
    queue: mpsc::Sender<PendingChecksInfo>,
}

impl PollLoop {
    pub fn new(
        gerrit: Arc<dyn GerritClient>,
        submissions: SubmissionHandler,
        scheme: impl Into<String>,
        interval: Duration,
        queue: mpsc::Sender<PendingChecksInfo>,
    ) -> Self {
        Self {
            gerrit,
            submissions,
            scheme: scheme.into(),
            interval,
            queue,
        }
    }

    /// One poll: fetch, run submissions, enqueue
    ///
    /// Fetch and submission failures are returned; a full queue is not an error.
    pub async fn tick(&self) -> Result<TickReport, ConnectorError> {
        let pending = self.gerrit.list_pending_checks(&self.scheme).await?;
        let merges = self.submissions.handle().await?;

        let mut report = TickReport {
            found: pending.len(),
            merges,
            ..TickReport::default()
        };

        if pending.is_empty() {
            info!("no pending checks");
        }

        for check in pending {
            match self.queue.try_send(check) {
                Ok(()) => report.enqueued += 1,
                Err(TrySendError::Full(check)) => {
                    warn!("too busy; dropping pending check {}", check.patch_set);
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => return Err(ConnectorError::QueueClosed),
            }
        }

        debug!("tick: {:?}", report);
        Ok(report)
    }

    /// Poll forever, restarting after failures as `policy` allows
    ///
    /// Returns only with the error that exhausted the policy, or at once when
    /// the executor has gone away.
    pub async fn run(&self, policy: &RestartPolicy) -> Result<(), ConnectorError> {
        info!(
            "Polling Gerrit every {:?} for scheme {:?}",
            self.interval, self.scheme
        );
        let mut failures: u32 = 0;

        loop {
            tokio::time::sleep(self.interval).await;

            match self.tick().await {
                Ok(_) => failures = 0,
                Err(ConnectorError::QueueClosed) => {
                    error!("check executor is gone; stopping poll loop");
                    return Err(ConnectorError::QueueClosed);
                }
                Err(e) => {
                    failures += 1;
                    if !policy.allows(failures) {
                        error!("poll failed {} times in a row, giving up: {}", failures, e);
                        return Err(e);
                    }
                    let pause = policy.backoff(failures);
                    warn!(
                        "poll failed ({}/{}), restarting in {:?}: {}",
                        failures, policy.max_restarts, pause, e
                    );
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }
}
