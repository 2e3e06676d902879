//! Scripted activity source for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::record::RawActivityRecord;
use crate::source::{ActivitySource, QueryWindow};

pub(crate) fn raw(first_seen: i64, last_seen: i64) -> RawActivityRecord {
    RawActivityRecord {
        callsign: None,
        departure_airport: None,
        arrival_airport: None,
        first_seen,
        last_seen,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub tracker_id: String,
    pub window: QueryWindow,
    pub started: Instant,
    pub finished: Instant,
}

/// Answers from a fixed script and records when each call ran.
///
/// Unscripted tracker ids answer with no records.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    responses: HashMap<String, Vec<RawActivityRecord>>,
    failures: HashSet<String>,
    panics: HashSet<String>,
    panic_from_call: Option<usize>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, tracker_id: &str, records: Vec<RawActivityRecord>) -> Self {
        self.responses.insert(tracker_id.to_string(), records);
        self
    }

    pub fn fail(mut self, tracker_id: &str) -> Self {
        self.failures.insert(tracker_id.to_string());
        self
    }

    pub fn panic_on(mut self, tracker_id: &str) -> Self {
        self.panics.insert(tracker_id.to_string());
        self
    }

    /// Panic on the `n`th call (1-based) and every call after it.
    pub fn panic_from_call(mut self, n: usize) -> Self {
        self.panic_from_call = Some(n);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ActivitySource for ScriptedSource {
    async fn fetch(
        &self,
        tracker_id: &str,
        window: QueryWindow,
    ) -> Result<Vec<RawActivityRecord>> {
        let started = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                tracker_id: tracker_id.to_string(),
                window,
                started,
                finished: Instant::now(),
            });
            calls.len()
        };

        assert!(
            !self.panics.contains(tracker_id),
            "scripted panic for {tracker_id}"
        );
        assert!(
            self.panic_from_call.map_or(true, |n| call_number < n),
            "scripted panic on call {call_number}"
        );
        if self.failures.contains(tracker_id) {
            return Err(Error::upstream_status(tracker_id, 503));
        }
        Ok(self.responses.get(tracker_id).cloned().unwrap_or_default())
    }
}
