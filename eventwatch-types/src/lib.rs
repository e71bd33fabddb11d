//! # eventwatch-types
//!
//! Core types for the channel event cache. This crate defines the shape of
//! everything the remote status service returns and everything the cache
//! publishes to its listeners.
//!
//! ## Overview
//!
//! - [`GroupedEvent`]: one alarm event for a channel, bucketed by aggregate state
//!   in a [`GroupedEventsResponse`]. After enrichment the same type is a *merged* event.
//! - [`StatusRecord`]: a per-channel idle/running record whose `data` field is a
//!   JSON document serialized as a string. [`StatusRecord::parse`] decodes it.
//! - [`Snapshot`]: the merged event list plus the parsed idle and running records
//!   from one successful poll.
//! - [`Delta`]: the added/removed events between two snapshots under one [`IdentityKey`].
//!
//! ## Example
//!
//! ```rust
//! use eventwatch_types::{GroupedEventsResponse, StatusKind, StatusRecord};
//!
//! let groups: GroupedEventsResponse = serde_json::from_str(
//!     r#"{"down": [{"resource_arn": "arn:ch:1", "alarm_id": "a1", "detail": {}}]}"#,
//! ).unwrap();
//! assert_eq!(groups.len(), 1);
//!
//! let record = StatusRecord::new("arn:ch:1", r#"{"idle_state": true}"#);
//! let parsed = record.parse(StatusKind::Idle).unwrap();
//! assert_eq!(parsed.idle_state(), Some(&serde_json::Value::Bool(true)));
//! ```

mod delta;
mod event;
mod snapshot;
mod status;

pub use delta::*;
pub use event::*;
pub use snapshot::*;
pub use status::*;
