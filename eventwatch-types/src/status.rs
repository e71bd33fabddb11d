//! Per-channel idle/running status records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which status feed a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Running,
}

impl StatusKind {
    /// Path segment used by the remote service for this feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Idle => "idle",
            StatusKind::Running => "running",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw status record as delivered by the idle or running feed.
///
/// `data` is a JSON document serialized into a string; call
/// [`StatusRecord::parse`] before using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub arn: String,
    pub data: String,
}

impl StatusRecord {
    pub fn new(arn: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            data: data.into(),
        }
    }

    /// Decode the `data` field.
    ///
    /// Fails if `data` is not a JSON object.
    pub fn parse(&self, kind: StatusKind) -> Result<ParsedStatus, serde_json::Error> {
        let data = serde_json::from_str(&self.data)?;
        Ok(ParsedStatus {
            arn: self.arn.clone(),
            kind,
            data,
        })
    }
}

/// The decoded `data` payload of a status record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusData {
    /// Usually a boolean; any JSON value is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_state: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A status record whose `data` has been decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatus {
    pub arn: String,
    pub kind: StatusKind,
    pub data: StatusData,
}

impl ParsedStatus {
    pub fn idle_state(&self) -> Option<&Value> {
        self.data.idle_state.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_idle_state_and_keeps_other_fields() {
        let record = StatusRecord::new(
            "arn:ch:1",
            r#"{"idle_state": "RUNNING", "pipelines_running_count": 2}"#,
        );

        let parsed = record.parse(StatusKind::Running).unwrap();
        assert_eq!(parsed.arn, "arn:ch:1");
        assert_eq!(parsed.kind, StatusKind::Running);
        assert_eq!(parsed.idle_state(), Some(&Value::from("RUNNING")));
        assert_eq!(parsed.data.extra["pipelines_running_count"], 2);
    }

    #[test]
    fn parse_accepts_boolean_idle_state() {
        let record = StatusRecord::new("arn:ch:1", r#"{"idle_state": true, "channel_id": "1"}"#);

        let parsed = record.parse(StatusKind::Idle).unwrap();
        assert_eq!(parsed.idle_state(), Some(&Value::Bool(true)));
        assert_eq!(parsed.data.extra["channel_id"], "1");
    }

    #[test]
    fn parse_without_idle_state_yields_none() {
        let record = StatusRecord::new("arn:ch:1", "{}");
        let parsed = record.parse(StatusKind::Idle).unwrap();
        assert_eq!(parsed.idle_state(), None);
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let record = StatusRecord::new("arn:ch:1", "{not json");
        assert!(record.parse(StatusKind::Idle).is_err());
    }

    #[test]
    fn parse_rejects_non_object_payload() {
        let record = StatusRecord::new("arn:ch:1", "[1, 2]");
        assert!(record.parse(StatusKind::Idle).is_err());
    }

    #[test]
    fn record_deserializes_from_feed_shape() {
        let records: Vec<StatusRecord> = serde_json::from_str(
            r#"[{"arn": "arn:ch:1", "data": "{\"idle_state\":\"IDLE\"}"}]"#,
        )
        .unwrap();

        assert_eq!(records[0].arn, "arn:ch:1");
        assert_eq!(records[0].data, r#"{"idle_state":"IDLE"}"#);
    }

    #[test]
    fn kind_display_matches_feed_path() {
        assert_eq!(StatusKind::Idle.to_string(), "idle");
        assert_eq!(StatusKind::Running.to_string(), "running");
    }
}
