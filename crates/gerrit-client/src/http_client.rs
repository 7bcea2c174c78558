//! reqwest-based Gerrit client
//!
//! Direct implementation of the `GerritClient` trait. Each call builds its
//! endpoint from the configured base URL, attaches the user agent and basic
//! auth header, checks the status and decodes the `)]}'`-prefixed body.

use crate::auth::BasicAuth;
use crate::client::GerritClient;
use crate::error::{Error, Result};
use crate::json::unmarshal;
use crate::types::{
    CheckInfo, CheckInput, CheckerInfo, CheckerInput, HashtagInput, PendingChecksInfo,
    SubmittableChange,
};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use std::time::Duration;

const PENDING_CHECKS_PATH: &str = "a/plugins/checks/checks.pending/";
const CHECKERS_PATH: &str = "a/plugins/checks/checkers/";

/// Gerrit client talking HTTP(S) through reqwest
#[derive(Debug, Clone)]
pub struct HttpGerritClient {
    http: Client,
    base_url: Url,
    user_agent: String,
    auth: Option<BasicAuth>,
    debug: bool,
}

impl HttpGerritClient {
    /// Create a client for the Gerrit host at `base_url`
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url =
            Url::parse(&normalized).map_err(|e| Error::Url(format!("{normalized}: {e}")))?;

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auth: None,
            debug: false,
        })
    }

    pub fn with_auth(mut self, auth: BasicAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Ask Gerrit to trace every request (`trace=0x1`)
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL and append `query`
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Url(format!("{}{path}: {e}", self.base_url)))?;

        if !query.is_empty() || self.debug {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if self.debug {
                pairs.append_pair("trace", "0x1");
            }
        }

        Ok(url)
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(USER_AGENT, &self.user_agent);
        match &self.auth {
            Some(auth) => request.header(AUTHORIZATION, auth.header_value()),
            None => request,
        }
    }

    async fn execute(&self, method: &'static str, url: Url, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.prepare(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let request = self.http.get(url.clone());
        self.execute("GET", url, request).await
    }

    async fn post_json<T: Serialize + Sync>(&self, url: Url, body: &T) -> Result<Vec<u8>> {
        debug!("POST {}", url);
        let body = serde_json::to_vec(body).map_err(Error::Encode)?;
        let request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.execute("POST", url, request).await
    }

    async fn pending_checks(&self, query: &str) -> Result<Vec<PendingChecksInfo>> {
        let url = self.endpoint(PENDING_CHECKS_PATH, &[("query", query)])?;
        let content = self.get(url).await?;
        unmarshal(&content)
    }
}

#[async_trait]
impl GerritClient for HttpGerritClient {
    async fn list_pending_checks(&self, scheme: &str) -> Result<Vec<PendingChecksInfo>> {
        let pending = self.pending_checks(&format!("scheme:{scheme}")).await?;
        debug!("Fetched {} pending checks for scheme {}", pending.len(), scheme);
        Ok(pending)
    }

    async fn pending_checks_for_checker(
        &self,
        checker_uuid: &str,
    ) -> Result<Vec<PendingChecksInfo>> {
        self.pending_checks(&format!("checker:{checker_uuid}")).await
    }

    async fn post_check(
        &self,
        change_id: &str,
        patchset_id: u32,
        input: &CheckInput,
    ) -> Result<CheckInfo> {
        let url = self.endpoint(
            &format!("a/changes/{change_id}/revisions/{patchset_id}/checks/"),
            &[],
        )?;
        let content = self.post_json(url, input).await?;
        unmarshal(&content)
    }

    async fn list_submittable_changes(&self) -> Result<Vec<SubmittableChange>> {
        let url = self.endpoint("a/changes/", &[("o", "SUBMITTABLE"), ("q", "is:open")])?;
        let content = self.get(url).await?;
        let changes: Vec<SubmittableChange> = unmarshal(&content)?;
        debug!("Fetched {} open changes", changes.len());
        Ok(changes)
    }

    async fn add_hashtags(&self, change_id: &str, input: &HashtagInput) -> Result<()> {
        let url = self.endpoint(&format!("a/changes/{change_id}/hashtags"), &[])?;
        // Gerrit answers with the resulting hashtag list, which nobody needs.
        self.post_json(url, input).await?;
        Ok(())
    }

    async fn list_checkers(&self) -> Result<Vec<CheckerInfo>> {
        let url = self.endpoint(CHECKERS_PATH, &[])?;
        let content = self.get(url).await?;
        unmarshal(&content)
    }

    async fn post_checker(
        &self,
        uuid: Option<&str>,
        input: &CheckerInput,
    ) -> Result<CheckerInfo> {
        let path = match uuid {
            Some(uuid) => format!("{CHECKERS_PATH}{uuid}"),
            None => CHECKERS_PATH.to_string(),
        };
        let url = self.endpoint(&path, &[])?;
        let content = self.post_json(url, input).await?;
        unmarshal(&content)
    }
}
