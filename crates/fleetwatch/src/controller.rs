//! The refresh controller.
//!
//! [`RefreshController`] is the single entry point a front-end talks to. It
//! moves between two states, [`ControllerState::Idle`] and
//! [`ControllerState::Fetching`]: `refresh()` starts a session when idle and
//! is ignored otherwise. A completed session publishes its view and stamps
//! the "last updated" time; a failed session leaves the previous view in
//! place.
//!
//! Sessions run on their own tokio task and always run to completion, even if
//! the caller stops waiting for them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::aggregate::AggregatedView;
use crate::clock::ClockTicker;
use crate::error::{Error, Result};
use crate::metrics::{Metrics, RateSetting};
use crate::record::FlightRecord;
use crate::registry::Registry;
use crate::scheduler::{FetchGate, Scheduler, SessionReport, SourceReport};
use crate::source::QueryWindow;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// No session is running.
    Idle,
    /// A session is running.
    Fetching,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
        }
    }
}

/// Summary of a session that completed and was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Flights in the published view.
    pub flight_count: usize,
    /// Aircraft whose fetch failed.
    pub failed_sources: usize,
    /// When the view was published.
    pub completed_at: DateTime<Utc>,
}

/// What a call to [`RefreshController::refresh`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A session ran and its view was published.
    Completed(RefreshSummary),
    /// A session was already running; nothing happened.
    Ignored,
    /// The session failed; the previous view is still published.
    Failed(String),
}

#[derive(Debug, Default)]
struct Published {
    view: Arc<AggregatedView>,
    sources: Vec<SourceReport>,
    window: Option<QueryWindow>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Shared {
    scheduler: Scheduler,
    registry: Registry,
    gate: FetchGate,
    rate: Arc<RateSetting>,
    published: RwLock<Published>,
    sessions_started: AtomicU64,
}

impl Shared {
    fn publish(&self, report: SessionReport) -> RefreshSummary {
        let completed_at = Utc::now();
        let summary = RefreshSummary {
            flight_count: report.view.len(),
            failed_sources: report.failure_count(),
            completed_at,
        };

        let mut published = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        published.view = Arc::new(report.view);
        published.sources = report.sources;
        published.window = Some(report.window);
        published.last_updated = Some(completed_at);

        summary
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Published> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the published view and runs refreshes.
///
/// This is a lightweight, cloneable handle; clones share the same state.
#[derive(Debug, Clone)]
pub struct RefreshController {
    shared: Arc<Shared>,
}

impl RefreshController {
    /// Create an idle controller with nothing published yet.
    #[must_use]
    pub fn new(scheduler: Scheduler, registry: Registry, rate: Arc<RateSetting>) -> Self {
        Self {
            shared: Arc::new(Shared {
                scheduler,
                registry,
                gate: FetchGate::new(),
                rate,
                published: RwLock::new(Published::default()),
                sessions_started: AtomicU64::new(0),
            }),
        }
    }

    /// Run a refresh and wait for it to finish.
    ///
    /// Returns [`RefreshOutcome::Ignored`] at once if a session is already
    /// running. Must be called from within a tokio runtime.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(task) = self.start_session() else {
            return RefreshOutcome::Ignored;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(join_err) => Err(Error::session(join_err.to_string())),
        };

        match result {
            Ok(summary) => RefreshOutcome::Completed(summary),
            Err(e) => {
                error!("Refresh failed, keeping previous results: {e}");
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    /// Start a refresh in the background.
    ///
    /// Returns `false` if a session was already running. Must be called from
    /// within a tokio runtime.
    pub fn trigger(&self) -> bool {
        let Some(task) = self.start_session() else {
            return false;
        };
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Refresh failed, keeping previous results: {e}"),
                Err(join_err) => error!(
                    "Refresh failed, keeping previous results: {}",
                    Error::session(join_err.to_string())
                ),
            }
        });
        true
    }

    fn start_session(&self) -> Option<JoinHandle<Result<RefreshSummary>>> {
        let Some(guard) = self.shared.gate.try_begin() else {
            debug!("Refresh ignored; a session is already running");
            return None;
        };
        let n = self.shared.sessions_started.fetch_add(1, Ordering::SeqCst) + 1;
        info!(session = n, "Refresh requested");

        let shared = Arc::clone(&self.shared);
        Some(tokio::spawn(async move {
            // Held until the session is published or has failed.
            let _guard = guard;
            let report = shared.scheduler.run_session(&shared.registry).await?;
            Ok(shared.publish(report))
        }))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        if self.shared.gate.is_busy() {
            ControllerState::Fetching
        } else {
            ControllerState::Idle
        }
    }

    /// Check if a session is running.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.state() == ControllerState::Fetching
    }

    /// The most recently published view.
    #[must_use]
    pub fn view(&self) -> Arc<AggregatedView> {
        Arc::clone(&self.shared.read().view)
    }

    /// Metrics for the published view at the current rate.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.shared.rate.metrics_for(&self.view())
    }

    /// Per-aircraft outcomes of the most recently published session.
    #[must_use]
    pub fn source_reports(&self) -> Vec<SourceReport> {
        self.shared.read().sources.clone()
    }

    /// Window of the most recently published session.
    #[must_use]
    pub fn window(&self) -> Option<QueryWindow> {
        self.shared.read().window
    }

    /// When the published view was produced.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.shared.read().last_updated
    }

    /// Number of sessions started so far.
    #[must_use]
    pub fn sessions_started(&self) -> u64 {
        self.shared.sessions_started.load(Ordering::SeqCst)
    }

    /// The aircraft this controller fetches.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    /// The current per-flight rate.
    #[must_use]
    pub fn rate(&self) -> Decimal {
        self.shared.rate.get()
    }

    /// Update the per-flight rate from user input.
    ///
    /// Invalid input is ignored and the previous rate kept; returns whether
    /// the input was accepted.
    pub fn set_rate(&self, input: &str) -> bool {
        self.shared.rate.set_from_str(input)
    }

    /// Start the cosmetic clock. The clock stops when the ticker is dropped.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn start_clock(&self, period: Duration) -> ClockTicker {
        ClockTicker::spawn(period)
    }

    /// One consistent read of everything a front-end displays.
    #[must_use]
    pub fn snapshot(&self, current_time: DateTime<Local>) -> DashboardSnapshot {
        let fetching = self.is_fetching();
        let published = self.shared.read();
        let metrics = self.shared.rate.metrics_for(&published.view);
        DashboardSnapshot {
            records: published.view.records().to_vec(),
            metrics,
            fetching,
            last_updated: published.last_updated,
            window: published.window,
            current_time,
            sources: published.sources.clone(),
        }
    }
}

/// Everything a front-end renders, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Published records, newest first.
    pub records: Vec<FlightRecord>,
    /// Metrics at the current rate.
    pub metrics: Metrics,
    /// Whether a session is running.
    pub fetching: bool,
    /// When the records were published.
    pub last_updated: Option<DateTime<Utc>>,
    /// Window the records were fetched for.
    pub window: Option<QueryWindow>,
    /// Displayed clock value.
    pub current_time: DateTime<Local>,
    /// Per-aircraft outcomes of the published session.
    pub sources: Vec<SourceReport>,
}
