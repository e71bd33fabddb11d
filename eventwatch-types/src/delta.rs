//! Differences between two snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GroupedEvent;

/// A field used to decide whether two events are "the same" when diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKey {
    /// `alarm_id`
    AlarmId,
    /// `detail.idle_state`
    IdleState,
    /// `detail.degraded`
    Degraded,
}

impl IdentityKey {
    /// Keys in the order the change detector tries them.
    pub const PRIORITY: [IdentityKey; 3] = [
        IdentityKey::AlarmId,
        IdentityKey::IdleState,
        IdentityKey::Degraded,
    ];

    /// Dotted path of the field in the event JSON.
    pub fn path(&self) -> &'static str {
        match self {
            IdentityKey::AlarmId => "alarm_id",
            IdentityKey::IdleState => "detail.idle_state",
            IdentityKey::Degraded => "detail.degraded",
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Events added and removed between two snapshots under one identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// The key that produced this delta.
    pub key: IdentityKey,
    /// Events in the current snapshot with no match in the previous one.
    pub added: Vec<GroupedEvent>,
    /// Events in the previous snapshot with no match in the current one.
    pub removed: Vec<GroupedEvent>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_alarm_then_idle_then_degraded() {
        assert_eq!(
            IdentityKey::PRIORITY,
            [
                IdentityKey::AlarmId,
                IdentityKey::IdleState,
                IdentityKey::Degraded
            ]
        );
    }

    #[test]
    fn display_uses_field_path() {
        assert_eq!(IdentityKey::AlarmId.to_string(), "alarm_id");
        assert_eq!(IdentityKey::IdleState.to_string(), "detail.idle_state");
        assert_eq!(IdentityKey::Degraded.to_string(), "detail.degraded");
    }

    #[test]
    fn delta_is_empty_only_when_both_sides_are() {
        let mut delta = Delta {
            key: IdentityKey::AlarmId,
            added: vec![],
            removed: vec![],
        };
        assert!(delta.is_empty());

        delta.removed.push(GroupedEvent::new("r1", "a1"));
        assert!(!delta.is_empty());
    }
}
