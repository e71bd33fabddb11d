//! Change detector: prioritized set difference between two event lists.

use std::collections::HashSet;

use eventwatch_types::{Delta, GroupedEvent, IdentityKey};
use serde_json::{Number, Value};

/// Value of an identity key on one event. A missing field is a value of its
/// own, equal only to other missing fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue<'a> {
    Missing,
    Flag(bool),
    Number(&'a Number),
    Text(&'a str),
    // Arrays and objects, compared by their serialized form.
    Compound(String),
}

impl<'a> KeyValue<'a> {
    fn of_json(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => KeyValue::Missing,
            Some(Value::Bool(b)) => KeyValue::Flag(*b),
            Some(Value::Number(n)) => KeyValue::Number(n),
            Some(Value::String(s)) => KeyValue::Text(s.as_str()),
            Some(other) => KeyValue::Compound(other.to_string()),
        }
    }
}

type Extractor = for<'a> fn(&'a GroupedEvent) -> KeyValue<'a>;

fn alarm_id(event: &GroupedEvent) -> KeyValue<'_> {
    event.alarm_id.as_deref().map_or(KeyValue::Missing, KeyValue::Text)
}

fn idle_state(event: &GroupedEvent) -> KeyValue<'_> {
    KeyValue::of_json(event.detail.idle_state.as_ref())
}

fn degraded(event: &GroupedEvent) -> KeyValue<'_> {
    event.detail.degraded.map_or(KeyValue::Missing, KeyValue::Flag)
}

/// Comparators in priority order.
const COMPARATORS: [(IdentityKey, Extractor); 3] = [
    (IdentityKey::AlarmId, alarm_id),
    (IdentityKey::IdleState, idle_state),
    (IdentityKey::Degraded, degraded),
];

/// Events of `left` whose key value does not occur anywhere in `right`.
///
/// Order and duplicates of `left` are preserved.
fn difference_by(
    left: &[GroupedEvent],
    right: &[GroupedEvent],
    key: Extractor,
) -> Vec<GroupedEvent> {
    let seen: HashSet<KeyValue<'_>> = right.iter().map(key).collect();
    left.iter()
        .filter(|event| !seen.contains(&key(event)))
        .cloned()
        .collect()
}

/// Added and removed events between `current` and `previous` under one key.
pub fn delta_by(key: IdentityKey, current: &[GroupedEvent], previous: &[GroupedEvent]) -> Delta {
    match COMPARATORS.iter().find(|(k, _)| *k == key) {
        Some(&(key, extract)) => delta_with(key, extract, current, previous),
        None => Delta {
            key,
            added: Vec::new(),
            removed: Vec::new(),
        },
    }
}

fn delta_with(
    key: IdentityKey,
    extract: Extractor,
    current: &[GroupedEvent],
    previous: &[GroupedEvent],
) -> Delta {
    Delta {
        key,
        added: difference_by(current, previous, extract),
        removed: difference_by(previous, current, extract),
    }
}

/// Decide whether `current` differs from `previous` in a way worth publishing.
///
/// Keys are tried in [`IdentityKey::PRIORITY`] order and the first non-empty
/// delta is returned. `None` means no key differs, whatever else changed.
///
/// # Example
///
/// ```rust
/// use eventwatch_cache::detect;
/// use eventwatch_types::{GroupedEvent, IdentityKey};
///
/// let previous = vec![GroupedEvent::new("r1", "a1").with_idle_state("IDLE")];
/// let current = vec![GroupedEvent::new("r1", "a1").with_idle_state("ACTIVE")];
///
/// let delta = detect(&current, &previous).unwrap();
/// assert_eq!(delta.key, IdentityKey::IdleState);
/// assert_eq!(delta.added.len(), 1);
/// assert_eq!(delta.removed.len(), 1);
/// ```
pub fn detect(current: &[GroupedEvent], previous: &[GroupedEvent]) -> Option<Delta> {
    COMPARATORS.iter().find_map(|&(key, extract)| {
        let delta = delta_with(key, extract, current, previous);
        (!delta.is_empty()).then_some(delta)
    })
}
