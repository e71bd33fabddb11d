//! Error types for the poller.

use std::fmt;

use eventwatch_types::StatusKind;
use thiserror::Error;

/// Boxed error from a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One of the three feeds fetched on every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Alarm events grouped by aggregate state.
    GroupedEvents,
    /// Per-channel idle or running status records.
    Status(StatusKind),
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::GroupedEvents => f.write_str("grouped events"),
            Feed::Status(kind) => write!(f, "{} status", kind),
        }
    }
}

/// A feed request failed.
#[derive(Debug, Error)]
#[error("{feed} feed request failed: {source}")]
pub struct FetchError {
    pub feed: Feed,
    #[source]
    pub source: BoxError,
}

impl FetchError {
    pub fn new(feed: Feed, source: impl Into<BoxError>) -> Self {
        Self {
            feed,
            source: source.into(),
        }
    }
}

/// A status record's `data` field could not be decoded.
#[derive(Debug, Error)]
#[error("{kind} status record for {arn} has unparsable data: {source}")]
pub struct RecordParseError {
    pub arn: String,
    pub kind: StatusKind,
    #[source]
    pub source: serde_json::Error,
}

/// Errors from a settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the backing storage failed.
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored settings document is malformed.
    #[error("settings are not a valid JSON object: {0}")]
    Format(#[from] serde_json::Error),

    /// The store refused the operation.
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`PollerService`](crate::PollerService) operations.
#[derive(Debug, Error)]
pub enum PollerError {
    /// A feed request failed; the cycle was abandoned.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Loading or persisting the update interval failed.
    #[error("update interval setting: {0}")]
    Settings(#[from] SettingsError),

    /// The update interval is zero or too long.
    #[error(
        "update interval must be between 1 and {max} seconds, got {0}",
        max = crate::poller::MAX_INTERVAL_SECS
    )]
    InvalidInterval(u64),

    /// `start()` was called before any interval was loaded or set.
    #[error("no update interval is known")]
    NoInterval,

    /// Another poll cycle has not finished yet.
    #[error("a poll cycle is already in progress")]
    TickInProgress,
}
