//! CI pipeline webhook
//!
//! Both check and merge dispatches are a JSON POST to the same event
//! listener. The `X-Jarvis` header tells the listener which pipeline to
//! trigger.

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Header selecting the pipeline on the event listener
pub const JARVIS_HEADER: &str = "X-Jarvis";

/// Reported for an accepted check dispatch when the listener says nothing more
pub const SUBMITTED_MESSAGE: &str = "Job has been submitted to the CI pipeline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Create,
    Merge,
}

impl DispatchKind {
    pub const fn header_value(self) -> &'static str {
        match self {
            DispatchKind::Create => "create",
            DispatchKind::Merge => "merge",
        }
    }
}

/// Body of a check dispatch (`X-Jarvis: create`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPayload {
    pub repo_root: String,
    pub project: String,
    pub change_number: String,
    pub patch_set_number: u32,
    pub checker_uuid: String,
}

/// Body of a merge dispatch (`X-Jarvis: merge`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePayload {
    pub repo_root: String,
    pub project: String,
    pub change_number: String,
}

/// What the pipeline made of a check dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The pipeline took the job
    Accepted {
        messages: Vec<String>,
        details_url: String,
    },
    /// The checker does not apply to this change
    Irrelevant,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid event listener url {0}")]
    Url(String),

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("POST {url}: status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to encode webhook payload: {0}")]
    Encode(#[source] serde_json::Error),
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn dispatch_check(&self, payload: &CheckPayload)
        -> Result<DispatchOutcome, PipelineError>;

    async fn dispatch_merge(&self, payload: &MergePayload) -> Result<(), PipelineError>;
}

/// Optional structured answer from the event listener
///
/// Listeners that know nothing about it (Tekton answers with its own event
/// id document) decode to the default, which means "accepted". An explicit
/// empty `messages` list is kept as is and reported as a failure.
#[derive(Debug, Default, Deserialize)]
struct WebhookReply {
    #[serde(default)]
    irrelevant: bool,
    #[serde(default)]
    messages: Option<Vec<String>>,
    #[serde(default)]
    url: String,
}

impl WebhookReply {
    fn into_outcome(self) -> DispatchOutcome {
        if self.irrelevant {
            return DispatchOutcome::Irrelevant;
        }
        DispatchOutcome::Accepted {
            messages: self
                .messages
                .unwrap_or_else(|| vec![SUBMITTED_MESSAGE.to_string()]),
            details_url: self.url,
        }
    }
}

/// Event-listener webhook client
#[derive(Debug, Clone)]
pub struct WebhookPipeline {
    http: Client,
    url: Url,
}

impl WebhookPipeline {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let url = Url::parse(url).map_err(|e| PipelineError::Url(format!("{url}: {e}")))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url })
    }

    async fn post<T: Serialize + Sync>(
        &self,
        kind: DispatchKind,
        payload: &T,
    ) -> Result<Vec<u8>, PipelineError> {
        let body = serde_json::to_vec(payload).map_err(PipelineError::Encode)?;
        debug!("POST {} ({})", self.url, kind.header_value());

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(JARVIS_HEADER, kind.header_value())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Pipeline for WebhookPipeline {
    async fn dispatch_check(
        &self,
        payload: &CheckPayload,
    ) -> Result<DispatchOutcome, PipelineError> {
        let body = self.post(DispatchKind::Create, payload).await?;
        Ok(parse_reply(&body))
    }

    async fn dispatch_merge(&self, payload: &MergePayload) -> Result<(), PipelineError> {
        self.post(DispatchKind::Merge, payload).await?;
        Ok(())
    }
}

pub(crate) fn parse_reply(body: &[u8]) -> DispatchOutcome {
    serde_json::from_slice::<WebhookReply>(body)
        .unwrap_or_default()
        .into_outcome()
}
