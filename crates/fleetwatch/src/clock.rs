//! Cosmetic "current time" ticker.
//!
//! The ticker only refreshes a displayed clock value. It never triggers a
//! fetch, and its task is aborted when the ticker is stopped or dropped.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Default period of the clock tick.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// A running clock task.
#[derive(Debug)]
pub struct ClockTicker {
    rx: watch::Receiver<DateTime<Local>>,
    task: JoinHandle<()>,
}

impl ClockTicker {
    /// Start ticking every `period`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = watch::channel(Local::now());
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let now = Local::now();
                trace!(%now, "Clock tick");
                tx.send_replace(now);
            }
        });
        Self { rx, task }
    }

    /// The time as of the most recent tick.
    #[must_use]
    pub fn now(&self) -> DateTime<Local> {
        *self.rx.borrow()
    }

    /// A receiver that is notified on every tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DateTime<Local>> {
        self.rx.clone()
    }

    /// Stop the ticker.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Check if the ticker task has ended.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
