//! The poller service: owns the cache, the listener registry and the timer.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use eventwatch_types::{CachedEvents, Delta, StatusKind};
use tracing::{debug, error, info, warn};

use crate::cache::SnapshotCache;
use crate::diff::detect;
use crate::error::{FetchError, PollerError};
use crate::merge::merge;
use crate::notify::{Listener, Notifier};
use crate::scheduler::{Scheduler, SchedulerState};
use crate::settings::{MemorySettings, SettingsStore, INTERVAL_SETTING_KEY};
use crate::source::StatusSource;

/// Longest accepted update interval: one year, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// What one completed poll cycle found.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No identity key differs from the previous snapshot; nobody was notified.
    Unchanged,
    /// Listeners were notified about this delta.
    Changed(Delta),
}

impl TickOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, TickOutcome::Changed(_))
    }
}

/// Polls the status source, keeps the current and previous snapshots, and
/// notifies listeners when a poll changes something.
///
/// Registering a listener does not start polling; call [`start`](Self::start)
/// or [`set_update_interval`](Self::set_update_interval).
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use eventwatch_cache::{listener, MemorySettings, PollerService, StatusSource};
///
/// # async fn run(source: Arc<dyn StatusSource>) -> Result<(), eventwatch_cache::PollerError> {
/// let poller = PollerService::builder(source)
///     .settings(Arc::new(MemorySettings::new()))
///     .build();
///
/// poller.add_callback(listener(|current, previous| {
///     println!("{} events now, {} before", current.len(), previous.len());
/// }));
///
/// // Persist a 30 second interval and start polling.
/// poller.set_update_interval(30).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PollerService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    source: Arc<dyn StatusSource>,
    settings: Arc<dyn SettingsStore>,
    settings_key: String,
    cache: SnapshotCache,
    notifier: Notifier,
    scheduler: Scheduler,
    // Seconds; 0 while unknown.
    interval_secs: AtomicU64,
    tick_in_progress: AtomicBool,
}

impl PollerService {
    /// Create a builder around a status source.
    pub fn builder(source: Arc<dyn StatusSource>) -> PollerServiceBuilder {
        PollerServiceBuilder::new(source)
    }

    /// Load the persisted update interval.
    ///
    /// Returns the interval in seconds, or `None` if nothing usable is stored
    /// (absent, not a number, zero, or above [`MAX_INTERVAL_SECS`]); the
    /// scheduler then stays idle until an
    /// interval is set. Does not start the timer.
    pub async fn load_interval(&self) -> Result<Option<u64>, PollerError> {
        let inner = &self.inner;
        let stored = inner.settings.get(&inner.settings_key).await?;

        let seconds = stored.as_deref().and_then(parse_seconds);
        match (stored.as_deref(), seconds) {
            (_, Some(seconds)) => {
                inner.interval_secs.store(seconds, Ordering::SeqCst);
                debug!(seconds, "loaded update interval");
            }
            (Some(raw), None) => warn!(value = raw, "ignoring unusable stored update interval"),
            (None, None) => debug!("no update interval stored"),
        }
        Ok(seconds)
    }

    /// The current and previous snapshots.
    pub fn get_cached_events(&self) -> CachedEvents {
        self.inner.cache.get()
    }

    /// Register a change listener. Returns `false` if it was already registered.
    pub fn add_callback(&self, listener: Listener) -> bool {
        self.inner.notifier.register(listener)
    }

    /// Remove a change listener. Returns `false` if it was not registered.
    pub fn remove_callback(&self, listener: &Listener) -> bool {
        self.inner.notifier.unregister(listener)
    }

    /// Start polling at the known interval.
    ///
    /// Does nothing if the timer already runs at that interval.
    pub fn start(&self) -> Result<(), PollerError> {
        let seconds = self.interval_seconds().ok_or(PollerError::NoInterval)?;
        let period = Duration::from_secs(seconds);
        if self.scheduler_state() == (SchedulerState::Scheduled { period }) {
            return Ok(());
        }
        Inner::schedule(&self.inner, period);
        Ok(())
    }

    /// Persist a new update interval and reschedule polling with it.
    ///
    /// `seconds` must be between 1 and [`MAX_INTERVAL_SECS`].
    ///
    /// The in-memory interval and the timer only change once the value has
    /// been stored; if storing fails the error is returned and the running
    /// timer, if any, is left as it was.
    pub async fn set_update_interval(&self, seconds: u64) -> Result<(), PollerError> {
        if !(1..=MAX_INTERVAL_SECS).contains(&seconds) {
            return Err(PollerError::InvalidInterval(seconds));
        }

        let inner = &self.inner;
        inner
            .settings
            .put(&inner.settings_key, &seconds.to_string())
            .await?;

        inner.interval_secs.store(seconds, Ordering::SeqCst);
        Inner::schedule(inner, Duration::from_secs(seconds));
        Ok(())
    }

    /// The update interval in milliseconds, if one is known.
    pub fn get_update_interval(&self) -> Option<u64> {
        self.interval_seconds().and_then(|s| s.checked_mul(1000))
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.inner.scheduler.state()
    }

    /// Cancel the timer. Cached snapshots and listeners are kept.
    pub fn stop(&self) {
        self.inner.scheduler.stop();
    }

    /// Run one poll cycle now: fetch, merge, detect, rotate, notify.
    ///
    /// If any feed request fails the cycle is abandoned and the cached
    /// snapshots are left untouched. Fails with
    /// [`PollerError::TickInProgress`] if another cycle has not finished.
    pub async fn poll_once(&self) -> Result<TickOutcome, PollerError> {
        self.inner.poll_once().await
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.notifier.len()
    }

    /// Description of the status source.
    pub fn source_description(&self) -> &str {
        self.inner.source.description()
    }

    fn interval_seconds(&self) -> Option<u64> {
        match self.inner.interval_secs.load(Ordering::SeqCst) {
            0 => None,
            seconds => Some(seconds),
        }
    }
}

impl Inner {
    fn schedule(this: &Arc<Self>, period: Duration) {
        let weak: Weak<Self> = Arc::downgrade(this);
        this.scheduler.schedule(period, move || {
            let inner = weak.upgrade();
            async move {
                if let Some(inner) = inner {
                    inner.run_tick().await;
                }
            }
        });
    }

    async fn run_tick(&self) {
        match self.poll_once().await {
            Ok(TickOutcome::Changed(delta)) => info!(
                key = %delta.key,
                added = delta.added.len(),
                removed = delta.removed.len(),
                "event cache changed"
            ),
            Ok(TickOutcome::Unchanged) => debug!("event cache unchanged"),
            Err(PollerError::TickInProgress) => {
                warn!("previous poll still running, skipping tick")
            }
            Err(e) => warn!(error = %e, "poll cycle skipped"),
        }
    }

    async fn poll_once(&self) -> Result<TickOutcome, PollerError> {
        let _guard =
            TickGuard::acquire(&self.tick_in_progress).ok_or(PollerError::TickInProgress)?;

        let (groups, idle, running) = tokio::join!(
            self.source.fetch_grouped_events(),
            self.source.fetch_statuses(StatusKind::Idle),
            self.source.fetch_statuses(StatusKind::Running),
        );

        let (groups, idle, running) = match (groups, idle, running) {
            (Ok(groups), Ok(idle), Ok(running)) => (groups, idle, running),
            (Err(first), idle, running) => return Err(abandon(first, [idle.err(), running.err()])),
            (Ok(_), Err(first), running) => return Err(abandon(first, [running.err()])),
            (Ok(_), Ok(_), Err(first)) => return Err(abandon(first, [])),
        };

        let outcome = merge(groups, idle, running);
        let previous = self.cache.get().current;
        let delta = detect(&outcome.snapshot.events, &previous.events);

        let cached = self.cache.rotate(outcome.snapshot);
        debug!(
            current = cached.current.len(),
            previous = cached.previous.len(),
            "rotated event cache"
        );

        let Some(delta) = delta else {
            return Ok(TickOutcome::Unchanged);
        };

        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            self.notifier
                .notify(cached.current_events(), cached.previous_events())
        }));
        match notified {
            Ok(count) => debug!(listeners = count, "notified listeners"),
            Err(_) => error!("change listener panicked; remaining listeners skipped this cycle"),
        }

        Ok(TickOutcome::Changed(delta))
    }
}

/// Log every failed feed and return the first failure as the cycle's error.
fn abandon<const N: usize>(first: FetchError, others: [Option<FetchError>; N]) -> PollerError {
    for err in std::iter::once(&first).chain(others.iter().flatten()) {
        error!(feed = %err.feed, error = %err, "feed request failed");
    }
    PollerError::Fetch(first)
}

/// Accepts what `parseInt`-style settings writers store: leading digits,
/// optionally surrounded by whitespace.
fn parse_seconds(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    match trimmed[..digits_end].parse::<u64>() {
        Ok(seconds) if (1..=MAX_INTERVAL_SECS).contains(&seconds) => Some(seconds),
        _ => None,
    }
}

/// Marks a poll cycle as running until dropped.
struct TickGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Builder for [`PollerService`].
#[derive(Debug)]
pub struct PollerServiceBuilder {
    source: Arc<dyn StatusSource>,
    settings: Option<Arc<dyn SettingsStore>>,
    settings_key: Option<String>,
}

impl PollerServiceBuilder {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            settings: None,
            settings_key: None,
        }
    }

    /// Set the store the update interval is persisted in (default: in-memory).
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Override the settings key (default: [`INTERVAL_SETTING_KEY`]).
    pub fn settings_key(mut self, key: impl Into<String>) -> Self {
        self.settings_key = Some(key.into());
        self
    }

    pub fn build(self) -> PollerService {
        PollerService {
            inner: Arc::new(Inner {
                source: self.source,
                settings: self.settings.unwrap_or_else(|| {
                    let memory: Arc<dyn SettingsStore> = Arc::new(MemorySettings::new());
                    memory
                }),
                settings_key: self
                    .settings_key
                    .unwrap_or_else(|| INTERVAL_SETTING_KEY.to_string()),
                cache: SnapshotCache::new(),
                notifier: Notifier::new(),
                scheduler: Scheduler::new(),
                interval_secs: AtomicU64::new(0),
                tick_in_progress: AtomicBool::new(false),
            }),
        }
    }
}
