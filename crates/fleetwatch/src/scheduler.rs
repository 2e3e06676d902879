//! Rate-limited, sequential fetch sessions.
//!
//! A session walks the registry in order and issues exactly one request at a
//! time, sleeping a fixed spacing between consecutive requests. A failure for
//! one aircraft is logged, recorded in that aircraft's [`SourceReport`], and
//! otherwise ignored: the session carries on with the next entry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::aggregate::{merge, AggregatedView};
use crate::error::Result;
use crate::record::{normalize, FlightRecord};
use crate::registry::{AircraftEntry, Registry};
use crate::source::{ActivitySource, QueryWindow};

/// Default spacing between consecutive upstream requests.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_millis(500);

/// Default length of the query window.
pub const DEFAULT_WINDOW_SPAN: Duration = Duration::from_secs(24 * 60 * 60);

/// What happened when one aircraft was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The request succeeded.
    Fetched {
        /// Number of records received.
        records: usize,
    },
    /// The request failed; the aircraft contributes no records this session.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

impl FetchOutcome {
    /// Check if the fetch failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetched { records } => write!(f, "ok ({records} flights)"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Per-aircraft result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    /// Tail number of the aircraft.
    pub tail_number: String,
    /// Tracker id that was queried.
    pub tracker_id: String,
    /// What happened.
    pub outcome: FetchOutcome,
}

/// Everything one session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Window every aircraft was queried with.
    pub window: QueryWindow,
    /// Merged records.
    pub view: AggregatedView,
    /// One report per registry entry, in registry order.
    pub sources: Vec<SourceReport>,
}

impl SessionReport {
    /// Number of aircraft whose fetch failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sources.iter().filter(|s| s.outcome.is_failure()).count()
    }
}

/// The single "a session is running" flag.
///
/// This is a lightweight, cloneable handle; clones share the same flag. It is
/// a gate, not a queue: a second [`FetchGate::try_begin`] while a session holds
/// the gate simply fails.
#[derive(Debug, Clone, Default)]
pub struct FetchGate {
    busy: Arc<AtomicBool>,
}

impl FetchGate {
    /// Create an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or return `None` if a session already holds it.
    ///
    /// The gate reopens when the returned guard is dropped.
    #[must_use]
    pub fn try_begin(&self) -> Option<GateGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GateGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Check if a session currently holds the gate.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Proof of holding the [`FetchGate`]; releases it on drop.
#[derive(Debug)]
pub struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Drives an [`ActivitySource`] across a registry.
pub struct Scheduler {
    source: Arc<dyn ActivitySource>,
    spacing: Duration,
    window_span: Duration,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("spacing", &self.spacing)
            .field("window_span", &self.window_span)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a scheduler with the default spacing and window.
    #[must_use]
    pub fn new(source: Arc<dyn ActivitySource>) -> Self {
        Self {
            source,
            spacing: DEFAULT_REQUEST_SPACING,
            window_span: DEFAULT_WINDOW_SPAN,
        }
    }

    /// Set the spacing between consecutive requests.
    #[must_use]
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the length of the query window.
    #[must_use]
    pub fn with_window_span(mut self, span: Duration) -> Self {
        self.window_span = span;
        self
    }

    /// Spacing between consecutive requests.
    #[must_use]
    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// The window a session starting at `now` queries.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured span is shorter than one second.
    pub fn window_at(&self, now: DateTime<Utc>) -> Result<QueryWindow> {
        QueryWindow::ending_at(now, self.window_span)
    }

    /// Run a session over `registry` with a window ending now.
    ///
    /// The window is fixed once, at session start, and shared by every
    /// aircraft.
    ///
    /// # Errors
    ///
    /// Returns an error only if no valid window can be formed. Per-aircraft
    /// failures never surface here.
    pub async fn run_session(&self, registry: &Registry) -> Result<SessionReport> {
        let window = self.window_at(Utc::now())?;
        Ok(self.run_session_in(registry, window).await)
    }

    /// Run a session over `registry` with an explicit window.
    pub async fn run_session_in(&self, registry: &Registry, window: QueryWindow) -> SessionReport {
        let span = info_span!(
            "session",
            aircraft = registry.len(),
            begin = window.start(),
            end = window.end()
        );
        self.sequential_fetch(registry, window)
            .instrument(span)
            .await
    }

    async fn sequential_fetch(&self, registry: &Registry, window: QueryWindow) -> SessionReport {
        info!("Starting fetch session");

        let mut per_aircraft = Vec::with_capacity(registry.len());
        let mut sources = Vec::with_capacity(registry.len());

        for (i, entry) in registry.entries().iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.spacing).await;
            }
            let (records, outcome) = self.fetch_one(entry, window).await;
            per_aircraft.push(records);
            sources.push(SourceReport {
                tail_number: entry.tail_number.clone(),
                tracker_id: entry.tracker_id.clone(),
                outcome,
            });
        }

        let view = merge(per_aircraft);
        let failed = sources.iter().filter(|s| s.outcome.is_failure()).count();
        info!(flights = view.len(), failed, "Fetch session complete");

        SessionReport {
            window,
            view,
            sources,
        }
    }

    async fn fetch_one(
        &self,
        entry: &AircraftEntry,
        window: QueryWindow,
    ) -> (Vec<FlightRecord>, FetchOutcome) {
        match self.source.fetch(&entry.tracker_id, window).await {
            Ok(raw) => {
                debug!(
                    tail_number = %entry.tail_number,
                    count = raw.len(),
                    "Fetched aircraft"
                );
                let records: Vec<FlightRecord> = raw
                    .into_iter()
                    .map(|r| normalize(r, &entry.tail_number))
                    .collect();
                let outcome = FetchOutcome::Fetched {
                    records: records.len(),
                };
                (records, outcome)
            }
            Err(e) => {
                warn!(
                    tail_number = %entry.tail_number,
                    tracker_id = %entry.tracker_id,
                    "Skipping aircraft this session: {e}"
                );
                (
                    Vec::new(),
                    FetchOutcome::Failed {
                        error: e.to_string(),
                    },
                )
            }
        }
    }
}
