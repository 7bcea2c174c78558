//! Gerrit REST data transfer objects
//!
//! Field names follow the checks plugin and change REST API verbatim, so these
//! types can be (de)serialized directly from and into request bodies.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Gerrit timestamps are UTC, formatted as `2009-11-17 20:34:58.651387237`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A point in time in Gerrit's wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_PARSE_FORMAT)
            .map(|naive| Timestamp(naive.and_utc()))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

/// A checker as returned by `GET a/plugins/checks/checkers/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerInfo {
    pub uuid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default)]
    pub repository: String,

    #[serde(default)]
    pub status: String,

    /// Submit-blocking conditions, e.g. `STATE_NOT_PASSING`
    #[serde(default)]
    pub blocking: Vec<String>,

    #[serde(default)]
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
}

/// Body for creating or updating a checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerInput {
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub repository: String,
    pub status: String,
    pub blocking: Vec<String>,
    pub query: String,
}

/// Body for `POST a/changes/<id>/revisions/<ps>/checks/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInput {
    pub checker_uuid: String,
    pub state: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<Timestamp>,
}

impl fmt::Display for CheckInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?}",
            self.checker_uuid, self.state, self.message
        )?;
        if !self.url.is_empty() {
            write!(f, " ({})", self.url)?;
        }
        Ok(())
    }
}

/// A check as stored by Gerrit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckInfo {
    #[serde(default)]
    pub repository: String,

    #[serde(default)]
    pub change_number: u64,

    #[serde(default)]
    pub patch_set_id: u32,

    #[serde(default)]
    pub checker_uuid: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub started: Option<Timestamp>,

    #[serde(default)]
    pub finished: Option<Timestamp>,

    #[serde(default)]
    pub created: Option<Timestamp>,

    #[serde(default)]
    pub updated: Option<Timestamp>,

    #[serde(default)]
    pub checker_name: Option<String>,

    #[serde(default)]
    pub checker_status: Option<String>,

    #[serde(default)]
    pub blocking: Vec<String>,
}

/// The (repository, change, patchset) a pending check refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckablePatchSetInfo {
    pub repository: String,
    pub change_number: u64,
    pub patch_set_id: u32,
}

impl fmt::Display for CheckablePatchSetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ps {}",
            self.repository, self.change_number, self.patch_set_id
        )
    }
}

/// State Gerrit reports for one pending checker
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingCheckInfo {
    #[serde(default)]
    pub state: String,
}

/// One patchset with the checkers still waiting for a verdict on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChecksInfo {
    pub patch_set: CheckablePatchSetInfo,

    /// Keyed by checker UUID; iteration order is the processing order
    #[serde(default)]
    pub pending_checks: BTreeMap<String, PendingCheckInfo>,
}

impl PendingChecksInfo {
    /// Checker UUIDs in processing order
    pub fn checker_uuids(&self) -> impl Iterator<Item = &str> {
        self.pending_checks.keys().map(String::as_str)
    }
}

/// A change returned by `GET a/changes/?o=SUBMITTABLE&q=is:open`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmittableChange {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub change_id: String,

    #[serde(rename = "_number", default)]
    pub number: u64,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub mergeable: bool,

    #[serde(default)]
    pub submittable: bool,

    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl SubmittableChange {
    pub fn has_hashtag(&self, hashtag: &str) -> bool {
        self.hashtags.iter().any(|h| h == hashtag)
    }
}

/// Body for `POST a/changes/<id>/hashtags`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HashtagInput {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl HashtagInput {
    pub fn add(hashtag: impl Into<String>) -> Self {
        Self {
            add: vec![hashtag.into()],
            remove: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_timestamp() -> Timestamp {
        let base = Utc.with_ymd_and_hms(2009, 11, 17, 20, 34, 58).unwrap();
        Timestamp(base + chrono::Duration::nanoseconds(651_387_237))
    }

    #[test]
    fn test_timestamp_wire_format() {
        let json = serde_json::to_string(&sample_timestamp()).unwrap();
        assert_eq!(json, "\"2009-11-17 20:34:58.651387237\"");

        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_timestamp());
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"5rNYEA4pMfHwhjc5QBiFiGypB4g4vc\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_checker_info_from_gerrit() {
        let json = r#"{
            "uuid": "jarvis:jarvispipeline-c3dfad99656b3d59b2c7ef8bc044cb4ce9f534b8",
            "name": "jarvispipeline",
            "description": "check source code formatting.",
            "repository": "ausf",
            "status": "ENABLED",
            "blocking": [],
            "query": "status:open",
            "created": "2021-02-23 16:54:54.000000000",
            "updated": "2021-02-23 16:54:54.000000000"
        }"#;
        let checker: CheckerInfo = serde_json::from_str(json).unwrap();
        assert_eq!(checker.name, "jarvispipeline");
        assert_eq!(checker.repository, "ausf");
        assert!(checker.blocking.is_empty());
        assert_eq!(
            checker.created.map(|t| t.to_string()),
            Some("2021-02-23 16:54:54.000000000".to_string())
        );
    }

    #[test]
    fn test_check_input_omits_missing_start() {
        let input = CheckInput {
            checker_uuid: "jarvis:go-abc".to_string(),
            state: "FAILED".to_string(),
            message: "boom".to_string(),
            url: String::new(),
            started: None,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "checker_uuid": "jarvis:go-abc",
                "state": "FAILED",
                "message": "boom",
                "url": ""
            })
        );
    }

    #[test]
    fn test_pending_checks_from_gerrit() {
        let json = r#"[{
            "patch_set": {"repository": "ausf", "change_number": 42, "patch_set_id": 3},
            "pending_checks": {
                "jarvis:go-bbb": {"state": "NOT_STARTED"},
                "jarvis:go-aaa": {"state": "NOT_STARTED"}
            }
        }]"#;
        let pending: Vec<PendingChecksInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].patch_set.to_string(), "ausf/42 ps 3");
        let uuids: Vec<&str> = pending[0].checker_uuids().collect();
        assert_eq!(uuids, vec!["jarvis:go-aaa", "jarvis:go-bbb"]);
    }

    #[test]
    fn test_submittable_change_defaults() {
        let json = r#"{"id": "ausf~master~I1", "change_id": "I1", "_number": 7, "project": "ausf"}"#;
        let change: SubmittableChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.number, 7);
        assert!(!change.mergeable);
        assert!(!change.submittable);
        assert!(change.hashtags.is_empty());
        assert!(!change.has_hashtag("jarvis-merge"));
    }

    #[test]
    fn test_hashtag_input_add() {
        let value = serde_json::to_value(HashtagInput::add("jarvis-merge")).unwrap();
        assert_eq!(value, serde_json::json!({"add": ["jarvis-merge"], "remove": []}));
    }
}
