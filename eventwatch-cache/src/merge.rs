//! Snapshot merger: combines the three feeds into one enriched event list.

use std::collections::HashMap;

use eventwatch_types::{
    GroupedEvent, GroupedEventsResponse, ParsedStatus, Snapshot, StatusKind, StatusRecord,
};
use tracing::{debug, warn};

use crate::error::RecordParseError;

/// Result of merging one poll's feeds.
#[derive(Debug)]
pub struct MergeOutcome {
    /// The merged snapshot, ready to publish.
    pub snapshot: Snapshot,
    /// Status records skipped because their `data` was not valid JSON.
    pub failures: Vec<RecordParseError>,
}

/// Merge grouped events with the idle and running status feeds.
///
/// The grouped buckets are flattened idle, degraded, down, running. Each
/// event's `detail.idle_state` is then taken from the idle record with the
/// same ARN, and after that from the running record with the same ARN, so
/// running data wins when both exist. Within one feed the first record for
/// an ARN is used.
///
/// A record whose `data` does not parse is logged, reported in
/// [`MergeOutcome::failures`] and left out; the rest of the merge proceeds.
///
/// # Example
///
/// ```rust
/// use eventwatch_cache::merge;
/// use eventwatch_types::{GroupedEvent, GroupedEventsResponse, StatusRecord};
///
/// let groups = GroupedEventsResponse {
///     down: vec![GroupedEvent::new("r1", "a1")],
///     ..Default::default()
/// };
/// let idle = vec![StatusRecord::new("r1", r#"{"idle_state":"IDLE"}"#)];
///
/// let outcome = merge(groups, idle, Vec::new());
/// assert_eq!(outcome.snapshot.events[0].detail.idle_state, Some("IDLE".into()));
/// ```
pub fn merge(
    groups: GroupedEventsResponse,
    idle: Vec<StatusRecord>,
    running: Vec<StatusRecord>,
) -> MergeOutcome {
    let mut events = groups.into_ordered();
    let mut failures = Vec::new();

    let idle = parse_records(&idle, StatusKind::Idle, &mut failures);
    let running = parse_records(&running, StatusKind::Running, &mut failures);

    enrich(&mut events, &idle);
    enrich(&mut events, &running);

    debug!(
        events = events.len(),
        idle = idle.len(),
        running = running.len(),
        skipped = failures.len(),
        "merged status feeds"
    );

    MergeOutcome {
        snapshot: Snapshot::builder()
            .events(events)
            .idle(idle)
            .running(running)
            .build(),
        failures,
    }
}

fn parse_records(
    records: &[StatusRecord],
    kind: StatusKind,
    failures: &mut Vec<RecordParseError>,
) -> Vec<ParsedStatus> {
    records
        .iter()
        .filter_map(|record| match record.parse(kind) {
            Ok(parsed) => Some(parsed),
            Err(source) => {
                let err = RecordParseError {
                    arn: record.arn.clone(),
                    kind,
                    source,
                };
                warn!(arn = %record.arn, %kind, error = %err, "skipping status record");
                failures.push(err);
                None
            }
        })
        .collect()
}

/// Copy `idle_state` from the first record per ARN onto every matching event.
fn enrich(events: &mut [GroupedEvent], records: &[ParsedStatus]) {
    let mut by_arn: HashMap<&str, &ParsedStatus> = HashMap::with_capacity(records.len());
    for record in records {
        by_arn.entry(record.arn.as_str()).or_insert(record);
    }

    for event in events.iter_mut() {
        let Some(arn) = event.resource_arn.as_deref() else {
            continue;
        };
        if let Some(record) = by_arn.get(arn) {
            event.detail.idle_state = record.data.idle_state.clone();
        }
    }
}
