//! Repeating poll timer.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Whether a poll timer is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer.
    Idle,
    /// A timer fires every `period`.
    Scheduled { period: Duration },
}

/// Owns at most one repeating timer task.
///
/// Installing a new timer stops the old one first. A tick that is already
/// running when its timer is replaced or stopped still runs to completion.
#[derive(Debug, Default)]
pub struct Scheduler {
    active: Mutex<Option<ActiveTimer>>,
}

#[derive(Debug)]
struct ActiveTimer {
    period: Duration,
    stop_tx: watch::Sender<bool>,
    // Kept so the task is tied to this timer; never awaited.
    _task: JoinHandle<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        match self.active.lock().as_ref() {
            Some(timer) => SchedulerState::Scheduled {
                period: timer.period,
            },
            None => SchedulerState::Idle,
        }
    }

    /// Install a timer that calls `tick` every `period`, replacing any
    /// existing timer.
    ///
    /// The first tick fires one full period from now. Ticks run one after
    /// another on the timer task; if a tick overruns, missed ticks are skipped.
    ///
    /// `period` must be non-zero and small enough to add to the current
    /// instant. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, period: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        tick().await;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!(?period, "poll timer stopped");
        });

        let previous = self.active.lock().replace(ActiveTimer {
            period,
            stop_tx,
            _task: task,
        });
        if let Some(previous) = previous {
            let _ = previous.stop_tx.send(true);
        }

        info!(period_ms = period.as_millis() as u64, "poll interval scheduled");
    }

    /// Remove the timer, if any.
    pub fn stop(&self) {
        if let Some(timer) = self.active.lock().take() {
            let _ = timer.stop_tx.send(true);
            info!("poll timer cancelled");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_tick(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[test]
    fn starts_idle() {
        assert_eq!(Scheduler::new().state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_fires_once_per_period() {
        let scheduler = Scheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_secs(5), counting_tick(&ticks));
        assert_eq!(
            scheduler.state(),
            SchedulerState::Scheduled {
                period: Duration::from_secs(5)
            }
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_replaces_the_old_timer() {
        let scheduler = Scheduler::new();
        let old_ticks = Arc::new(AtomicUsize::new(0));
        let new_ticks = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_secs(2), counting_tick(&old_ticks));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(old_ticks.load(Ordering::SeqCst), 1);

        scheduler.schedule(Duration::from_secs(10), counting_tick(&new_ticks));
        assert_eq!(
            scheduler.state(),
            SchedulerState::Scheduled {
                period: Duration::from_secs(10)
            }
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(old_ticks.load(Ordering::SeqCst), 1);
        assert_eq!(new_ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_returns_to_idle_and_halts_ticks() {
        let scheduler = Scheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_secs(1), counting_tick(&ticks));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_halts_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = Scheduler::new();
            scheduler.schedule(Duration::from_secs(1), counting_tick(&ticks));
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
