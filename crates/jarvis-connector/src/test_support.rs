//! In-memory Gerrit and pipeline doubles for unit tests

use crate::pipeline::{CheckPayload, DispatchOutcome, MergePayload, Pipeline, PipelineError, SUBMITTED_MESSAGE};
use async_trait::async_trait;
use gerrit_client::{
    CheckInfo, CheckInput, CheckablePatchSetInfo, CheckerInfo, CheckerInput, GerritClient,
    HashtagInput, PendingCheckInfo, PendingChecksInfo, SubmittableChange,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Shared call log, so ordering across both doubles can be asserted
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn pending_check(
    repository: &str,
    change_number: u64,
    patch_set_id: u32,
    uuids: &[&str],
) -> PendingChecksInfo {
    PendingChecksInfo {
        patch_set: CheckablePatchSetInfo {
            repository: repository.to_string(),
            change_number,
            patch_set_id,
        },
        pending_checks: uuids
            .iter()
            .map(|uuid| {
                (
                    uuid.to_string(),
                    PendingCheckInfo {
                        state: "NOT_STARTED".to_string(),
                    },
                )
            })
            .collect(),
    }
}

fn gerrit_error(method: &'static str, url: &str) -> gerrit_client::Error {
    gerrit_client::Error::Status {
        method,
        url: url.to_string(),
        status: 500,
    }
}

#[derive(Default)]
pub struct MockGerrit {
    pub pending: Mutex<Vec<PendingChecksInfo>>,
    pub changes: Mutex<Vec<SubmittableChange>>,
    pub checkers: Mutex<Vec<CheckerInfo>>,

    pub posted: Mutex<Vec<(String, u32, CheckInput)>>,
    pub posted_checkers: Mutex<Vec<(Option<String>, CheckerInput)>>,
    pub hashtags: Mutex<Vec<(String, HashtagInput)>>,

    pub pending_calls: AtomicUsize,
    pub post_check_calls: AtomicUsize,

    pub fail_pending: bool,
    pub fail_changes: bool,
    pub fail_hashtags: bool,
    pub fail_post_check_at: Option<usize>,

    pub journal: Journal,
}

impl MockGerrit {
    pub fn failing_post_check_at(index: usize) -> Self {
        Self {
            fail_post_check_at: Some(index),
            ..Self::default()
        }
    }

    pub fn posted_checks(&self) -> Vec<(String, u32, CheckInput)> {
        self.posted.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl GerritClient for MockGerrit {
    async fn list_pending_checks(
        &self,
        scheme: &str,
    ) -> gerrit_client::Result<Vec<PendingChecksInfo>> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pending {
            return Err(gerrit_error("GET", "a/plugins/checks/checks.pending/"));
        }
        self.record(format!("pending {scheme}"));
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn pending_checks_for_checker(
        &self,
        checker_uuid: &str,
    ) -> gerrit_client::Result<Vec<PendingChecksInfo>> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.pending_checks.contains_key(checker_uuid))
            .cloned()
            .collect())
    }

    async fn post_check(
        &self,
        change_id: &str,
        patchset_id: u32,
        input: &CheckInput,
    ) -> gerrit_client::Result<CheckInfo> {
        let call = self.post_check_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_post_check_at == Some(call) {
            return Err(gerrit_error("POST", "a/changes/checks/"));
        }
        self.posted
            .lock()
            .unwrap()
            .push((change_id.to_string(), patchset_id, input.clone()));
        Ok(CheckInfo {
            checker_uuid: input.checker_uuid.clone(),
            state: input.state.clone(),
            patch_set_id: patchset_id,
            ..CheckInfo::default()
        })
    }

    async fn list_submittable_changes(&self) -> gerrit_client::Result<Vec<SubmittableChange>> {
        if self.fail_changes {
            return Err(gerrit_error("GET", "a/changes/"));
        }
        self.record("changes".to_string());
        Ok(self.changes.lock().unwrap().clone())
    }

    async fn add_hashtags(&self, change_id: &str, input: &HashtagInput) -> gerrit_client::Result<()> {
        if self.fail_hashtags {
            return Err(gerrit_error("POST", "a/changes/hashtags"));
        }
        self.record(format!("tag {change_id}"));
        self.hashtags
            .lock()
            .unwrap()
            .push((change_id.to_string(), input.clone()));
        Ok(())
    }

    async fn list_checkers(&self) -> gerrit_client::Result<Vec<CheckerInfo>> {
        Ok(self.checkers.lock().unwrap().clone())
    }

    async fn post_checker(
        &self,
        uuid: Option<&str>,
        input: &CheckerInput,
    ) -> gerrit_client::Result<CheckerInfo> {
        self.posted_checkers
            .lock()
            .unwrap()
            .push((uuid.map(str::to_string), input.clone()));
        Ok(CheckerInfo {
            uuid: input.uuid.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            url: input.url.clone(),
            repository: input.repository.clone(),
            status: input.status.clone(),
            blocking: input.blocking.clone(),
            query: input.query.clone(),
            created: None,
            updated: None,
        })
    }
}

#[derive(Default)]
pub struct MockPipeline {
    /// Answers for successive check dispatches; accepted once exhausted
    pub check_results: Mutex<VecDeque<Result<DispatchOutcome, PipelineError>>>,
    pub checks: Mutex<Vec<CheckPayload>>,
    pub merges: Mutex<Vec<MergePayload>>,
    pub fail_merge: bool,
    pub journal: Journal,
}

impl MockPipeline {
    pub fn with_results(results: Vec<Result<DispatchOutcome, PipelineError>>) -> Self {
        Self {
            check_results: Mutex::new(results.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Pipeline for MockPipeline {
    async fn dispatch_check(
        &self,
        payload: &CheckPayload,
    ) -> Result<DispatchOutcome, PipelineError> {
        self.checks.lock().unwrap().push(payload.clone());
        self.check_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(DispatchOutcome::Accepted {
                    messages: vec![SUBMITTED_MESSAGE.to_string()],
                    details_url: String::new(),
                })
            })
    }

    async fn dispatch_merge(&self, payload: &MergePayload) -> Result<(), PipelineError> {
        if self.fail_merge {
            return Err(PipelineError::Status {
                url: "http://el-jarvis/".to_string(),
                status: 502,
            });
        }
        self.journal
            .lock()
            .unwrap()
            .push(format!("merge {}", payload.change_number));
        self.merges.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

// One-shot HTTP server for exercising the real webhook request path

/// The request the server received
#[derive(Debug)]
pub struct Recorded {
    /// Request line, e.g. `POST / HTTP/1.1`
    pub request_line: String,
    /// Header lines, lowercased
    pub headers: Vec<String>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_lowercase());
        self.headers
            .iter()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
            .map(str::trim)
    }
}

/// Serve exactly one request, answering with `status` and `body`
///
/// Returns the base URL to point a client at and a handle yielding the
/// recorded request.
pub async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        let (head_end, content_length) = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            raw.extend_from_slice(&buf[..n]);
            if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (end, length);
            }
        };
        while raw.len() < head_end + 4 + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let head = String::from_utf8_lossy(&raw[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers = lines.map(str::to_lowercase).collect();
        let body = String::from_utf8_lossy(&raw[head_end + 4..]).into_owned();

        Recorded {
            request_line,
            headers,
            body,
        }
    });

    (format!("http://{addr}/"), handle)
}
