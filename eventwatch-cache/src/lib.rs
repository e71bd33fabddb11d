//! # eventwatch-cache
//!
//! Polling cache for channel alarm events.
//!
//! On every tick the poller fetches three feeds from a [`StatusSource`]:
//! alarm events grouped by channel state, idle status records and running
//! status records. It merges them into one event list, compares the result
//! with the previous poll and notifies registered listeners when something
//! that matters changed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eventwatch_cache::{listener, FileSettings, PollerService, StatusSource};
//!
//! # async fn run(source: Arc<dyn StatusSource>) -> Result<(), eventwatch_cache::PollerError> {
//! let poller = PollerService::builder(source)
//!     .settings(Arc::new(FileSettings::new("settings.json")))
//!     .build();
//!
//! poller.add_callback(listener(|current, _previous| {
//!     println!("{} alarm events", current.len());
//! }));
//!
//! // Resume with the persisted interval, if any.
//! if poller.load_interval().await?.is_some() {
//!     poller.start()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Change detection
//!
//! Two polls differ when the set of `alarm_id`s, `detail.idle_state`s or
//! `detail.degraded` flags differs, checked in that order. See [`detect`].

mod cache;
mod diff;
mod error;
mod merge;
mod notify;
mod poller;
mod scheduler;
mod settings;
mod source;

pub use cache::SnapshotCache;
pub use diff::{delta_by, detect};
pub use error::{BoxError, Feed, FetchError, PollerError, RecordParseError, SettingsError};
pub use merge::{merge, MergeOutcome};
pub use notify::{listener, Listener, Notifier};
pub use poller::{PollerService, PollerServiceBuilder, TickOutcome, MAX_INTERVAL_SECS};
pub use scheduler::{Scheduler, SchedulerState};
pub use settings::{FileSettings, MemorySettings, SettingsStore, INTERVAL_SETTING_KEY};
pub use source::StatusSource;

// Re-export types for convenience
pub use eventwatch_types::{
    CachedEvents, Delta, EventDetail, GroupedEvent, GroupedEventsResponse, IdentityKey, Snapshot,
    StatusKind, StatusRecord,
};
