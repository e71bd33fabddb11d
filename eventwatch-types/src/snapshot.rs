//! Snapshot - the merged view of every feed at one successful poll.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{GroupedEvent, ParsedStatus};

/// A point-in-time view of channel events.
///
/// A snapshot is published once and never mutated afterwards; each poll
/// replaces it wholesale. It carries the merged event list together with the
/// parsed idle and running records it was enriched from.
///
/// # Example
///
/// ```rust
/// use eventwatch_types::{GroupedEvent, Snapshot};
///
/// let snapshot = Snapshot::builder()
///     .timestamp_ms(1703160000000)
///     .event(GroupedEvent::new("arn:ch:1", "a1").with_idle_state("IDLE"))
///     .build();
///
/// assert_eq!(snapshot.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix timestamp in milliseconds when the poll completed. Zero for the
    /// empty snapshot that exists before the first poll.
    pub timestamp_ms: u64,

    /// Merged events, ordered idle, degraded, down, running.
    pub events: Vec<GroupedEvent>,

    /// Parsed records from the idle feed.
    pub idle: Vec<ParsedStatus>,

    /// Parsed records from the running feed.
    pub running: Vec<ParsedStatus>,
}

impl Snapshot {
    /// The snapshot held before any poll has succeeded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Number of merged events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Merged events for one resource.
    pub fn events_for<'a>(&'a self, arn: &'a str) -> impl Iterator<Item = &'a GroupedEvent> {
        self.events.iter().filter(move |e| e.is_for(arn))
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    events: Vec<GroupedEvent>,
    idle: Vec<ParsedStatus>,
    running: Vec<ParsedStatus>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    pub fn event(mut self, event: GroupedEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = GroupedEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn idle(mut self, records: impl IntoIterator<Item = ParsedStatus>) -> Self {
        self.idle.extend(records);
        self
    }

    pub fn running(mut self, records: impl IntoIterator<Item = ParsedStatus>) -> Self {
        self.running.extend(records);
        self
    }

    /// Build the snapshot, stamping it with the current time unless a
    /// timestamp was given.
    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            events: self.events,
            idle: self.idle,
            running: self.running,
        }
    }
}

/// The current and previous snapshots, read together.
///
/// Both sides are shared handles; cloning a `CachedEvents` never copies the
/// event lists.
#[derive(Debug, Clone)]
pub struct CachedEvents {
    pub current: Arc<Snapshot>,
    pub previous: Arc<Snapshot>,
}

impl CachedEvents {
    /// Two distinct empty snapshots.
    pub fn empty() -> Self {
        Self {
            current: Arc::new(Snapshot::empty()),
            previous: Arc::new(Snapshot::empty()),
        }
    }

    /// Merged events of the current snapshot.
    pub fn current_events(&self) -> &[GroupedEvent] {
        &self.current.events
    }

    /// Merged events of the previous snapshot.
    pub fn previous_events(&self) -> &[GroupedEvent] {
        &self.previous.events
    }
}

impl Default for CachedEvents {
    fn default() -> Self {
        Self::empty()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
