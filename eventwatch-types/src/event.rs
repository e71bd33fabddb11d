//! Grouped alarm events as returned by the remote status service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One alarm event for a channel.
///
/// The same type is used before and after enrichment: a *merged* event is a
/// grouped event whose [`EventDetail::idle_state`] has been filled in from the
/// idle/running status feeds.
///
/// Fields this crate does not interpret are kept in `extra` so the event
/// re-serializes with everything the remote sent.
///
/// # Example
///
/// ```rust
/// use eventwatch_types::GroupedEvent;
///
/// let event: GroupedEvent = serde_json::from_str(
///     r#"{"resource_arn": "arn:ch:1", "alarm_id": "a1", "alarm_state": "set",
///         "detail": {"degraded": true, "pipeline": "0"}}"#,
/// ).unwrap();
///
/// assert_eq!(event.alarm_id.as_deref(), Some("a1"));
/// assert_eq!(event.detail.degraded, Some(true));
/// assert!(event.extra.contains_key("alarm_state"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupedEvent {
    /// Identifier of the channel (or multiplex) that raised the alarm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,

    /// Identifier of the alarm itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<String>,

    /// Nested detail structure, patched in place during merge.
    #[serde(default)]
    pub detail: EventDetail,

    /// Remaining top-level fields (`alarm_state`, `timestamp`, `expires`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupedEvent {
    /// Create an event for a resource and alarm with an empty detail.
    pub fn new(resource_arn: impl Into<String>, alarm_id: impl Into<String>) -> Self {
        Self {
            resource_arn: Some(resource_arn.into()),
            alarm_id: Some(alarm_id.into()),
            ..Self::default()
        }
    }

    /// Set `detail.idle_state`.
    pub fn with_idle_state(mut self, idle_state: impl Into<Value>) -> Self {
        self.detail.idle_state = Some(idle_state.into());
        self
    }

    /// Set `detail.degraded`.
    pub fn with_degraded(mut self, degraded: bool) -> Self {
        self.detail.degraded = Some(degraded);
        self
    }

    /// Whether this event belongs to the given resource.
    pub fn is_for(&self, arn: &str) -> bool {
        self.resource_arn.as_deref() == Some(arn)
    }
}

/// Detail payload of a [`GroupedEvent`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventDetail {
    /// Idle state of the channel, written by the merger.
    ///
    /// Kept as raw JSON: the status service reports a boolean, older
    /// deployments a string. `null` reads as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_state: Option<Value>,

    /// Set by the grouping service when only part of the pipelines are down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,

    /// Remaining detail fields (`running`, `pipeline_state`, `time`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Alarm events bucketed by aggregate channel state.
///
/// Every bucket defaults to empty: the grouping service does not always
/// emit an `idle` bucket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupedEventsResponse {
    #[serde(default)]
    pub idle: Vec<GroupedEvent>,
    #[serde(default)]
    pub degraded: Vec<GroupedEvent>,
    #[serde(default)]
    pub down: Vec<GroupedEvent>,
    #[serde(default)]
    pub running: Vec<GroupedEvent>,
}

impl GroupedEventsResponse {
    /// Total number of events across all buckets.
    pub fn len(&self) -> usize {
        self.idle.len() + self.degraded.len() + self.down.len() + self.running.len()
    }

    /// Whether every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten the buckets into one list, ordered idle, degraded, down, running.
    ///
    /// Order within each bucket is preserved.
    pub fn into_ordered(self) -> Vec<GroupedEvent> {
        let mut events = Vec::with_capacity(self.len());
        events.extend(self.idle);
        events.extend(self.degraded);
        events.extend(self.down);
        events.extend(self.running);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_buckets_default_to_empty() {
        let groups: GroupedEventsResponse =
            serde_json::from_str(r#"{"running": [{"alarm_id": "a1"}]}"#).unwrap();

        assert!(groups.idle.is_empty());
        assert!(groups.degraded.is_empty());
        assert!(groups.down.is_empty());
        assert_eq!(groups.running.len(), 1);
    }

    #[test]
    fn into_ordered_preserves_bucket_then_intra_bucket_order() {
        let groups = GroupedEventsResponse {
            idle: vec![GroupedEvent::new("r1", "i1"), GroupedEvent::new("r1", "i2")],
            degraded: vec![GroupedEvent::new("r2", "g1")],
            down: vec![GroupedEvent::new("r3", "d1")],
            running: vec![GroupedEvent::new("r4", "u1"), GroupedEvent::new("r4", "u2")],
        };

        let ids: Vec<_> = groups
            .into_ordered()
            .into_iter()
            .map(|e| e.alarm_id.unwrap())
            .collect();

        assert_eq!(ids, ["i1", "i2", "g1", "d1", "u1", "u2"]);
    }

    #[test]
    fn unknown_fields_survive_reserialization() {
        let raw = r#"{"resource_arn":"arn:ch:1","alarm_id":"a1","alarm_state":"set",
                      "detail":{"pipeline":"1","running":false}}"#;
        let event: GroupedEvent = serde_json::from_str(raw).unwrap();

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["alarm_state"], "set");
        assert_eq!(value["detail"]["pipeline"], "1");
        assert_eq!(value["detail"]["running"], false);
        assert!(value["detail"].get("idle_state").is_none());
    }

    #[test]
    fn boolean_idle_state_decodes() {
        let groups: GroupedEventsResponse = serde_json::from_str(
            r#"{"down": [{"resource_arn": "arn:ch:1", "alarm_id": "a1",
                          "detail": {"idle_state": false, "degraded": false}}]}"#,
        )
        .unwrap();

        let detail = &groups.down[0].detail;
        assert_eq!(detail.idle_state, Some(Value::Bool(false)));
        assert_eq!(detail.degraded, Some(false));
    }

    #[test]
    fn null_idle_state_reads_as_absent() {
        let event: GroupedEvent =
            serde_json::from_str(r#"{"alarm_id": "a1", "detail": {"idle_state": null}}"#).unwrap();
        assert_eq!(event.detail.idle_state, None);
    }

    #[test]
    fn missing_detail_defaults_to_empty() {
        let event: GroupedEvent = serde_json::from_str(r#"{"alarm_id": "a1"}"#).unwrap();
        assert_eq!(event.detail, EventDetail::default());
        assert!(event.resource_arn.is_none());
    }

    #[test]
    fn is_for_matches_resource_arn() {
        let event = GroupedEvent::new("arn:ch:1", "a1");
        assert!(event.is_for("arn:ch:1"));
        assert!(!event.is_for("arn:ch:2"));
        assert!(!GroupedEvent::default().is_for(""));
    }
}
