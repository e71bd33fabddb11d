//! Remote status source abstraction.

use std::fmt::Debug;

use async_trait::async_trait;
use eventwatch_types::{GroupedEventsResponse, StatusKind, StatusRecord};

use crate::error::FetchError;

/// Read access to the remote status service.
///
/// The poller calls all three fetches concurrently once per cycle.
/// Implementations own authentication and any request timeout.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use eventwatch_cache::{FetchError, StatusSource};
/// use eventwatch_types::{GroupedEventsResponse, StatusKind, StatusRecord};
///
/// #[derive(Debug)]
/// struct Quiet;
///
/// #[async_trait]
/// impl StatusSource for Quiet {
///     async fn fetch_grouped_events(&self) -> Result<GroupedEventsResponse, FetchError> {
///         Ok(GroupedEventsResponse::default())
///     }
///
///     async fn fetch_statuses(&self, _kind: StatusKind) -> Result<Vec<StatusRecord>, FetchError> {
///         Ok(Vec::new())
///     }
///
///     fn description(&self) -> &str {
///         "quiet"
///     }
/// }
/// ```
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Alarm events in the `set` state, grouped by aggregate channel state.
    async fn fetch_grouped_events(&self) -> Result<GroupedEventsResponse, FetchError>;

    /// Per-channel status records for the idle or running feed.
    async fn fetch_statuses(&self, kind: StatusKind) -> Result<Vec<StatusRecord>, FetchError>;

    /// Human-readable description of the source, used in logs.
    fn description(&self) -> &str;
}
