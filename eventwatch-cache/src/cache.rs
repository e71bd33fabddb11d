//! Current/previous snapshot pair.

use std::sync::Arc;

use eventwatch_types::{CachedEvents, Snapshot};
use parking_lot::RwLock;

/// Holds the current and previous snapshots and rotates them as one step.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    inner: RwLock<CachedEvents>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read both snapshots. Never observes a half-rotated pair.
    pub fn get(&self) -> CachedEvents {
        self.inner.read().clone()
    }

    /// Publish `snapshot` as current; the old current becomes previous.
    ///
    /// Returns the pair as it stands after rotation.
    pub fn rotate(&self, snapshot: Snapshot) -> CachedEvents {
        let mut inner = self.inner.write();
        let current = Arc::new(snapshot);
        inner.previous = std::mem::replace(&mut inner.current, current);
        inner.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventwatch_types::GroupedEvent;

    fn snapshot(alarm: &str) -> Snapshot {
        Snapshot::builder()
            .event(GroupedEvent::new("r1", alarm))
            .build()
    }

    #[test]
    fn starts_with_two_empty_snapshots() {
        let cache = SnapshotCache::new();
        let cached = cache.get();
        assert!(cached.current.is_empty());
        assert!(cached.previous.is_empty());
    }

    #[test]
    fn rotate_moves_current_to_previous() {
        let cache = SnapshotCache::new();
        cache.rotate(snapshot("a1"));
        let before = cache.get();

        let after = cache.rotate(snapshot("a2"));

        assert!(Arc::ptr_eq(&after.previous, &before.current));
        assert_eq!(after.current.events[0].alarm_id.as_deref(), Some("a2"));
        assert_eq!(after.previous.events[0].alarm_id.as_deref(), Some("a1"));
    }

    #[test]
    fn rotated_pair_never_shares_a_snapshot() {
        let cache = SnapshotCache::new();
        for alarm in ["a1", "a1", "a2"] {
            let cached = cache.rotate(snapshot(alarm));
            assert!(!Arc::ptr_eq(&cached.current, &cached.previous));
        }
    }

    #[test]
    fn readers_keep_their_snapshot_after_rotation() {
        let cache = SnapshotCache::new();
        cache.rotate(snapshot("a1"));
        let held = cache.get();

        cache.rotate(snapshot("a2"));
        cache.rotate(snapshot("a3"));

        assert_eq!(held.current.events[0].alarm_id.as_deref(), Some("a1"));
    }
}
