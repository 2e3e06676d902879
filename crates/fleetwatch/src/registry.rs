//! The fleet of aircraft being tracked.
//!
//! A registry maps human-readable tail numbers to the ICAO24 tracker ids the
//! upstream service is addressed by. It is loaded once and never mutated, and
//! its iteration order is the order requests are issued in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Built-in fleet, used when the configuration does not override it.
const BUILTIN_FLEET: &[(&str, &str)] = &[
    ("N350XR", "a3f1c2"),
    ("N481JB", "a5e0b7"),
    ("N712AV", "a98d4e"),
    ("N905PC", "ac6b31"),
];

/// One tracked aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftEntry {
    /// Registration, e.g. `N350XR`.
    pub tail_number: String,
    /// Hex identifier used by the tracking service.
    pub tracker_id: String,
}

impl AircraftEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(tail_number: impl Into<String>, tracker_id: impl Into<String>) -> Self {
        Self {
            tail_number: tail_number.into(),
            tracker_id: tracker_id.into(),
        }
    }
}

/// An ordered, immutable set of aircraft.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    entries: Arc<[AircraftEntry]>,
}

impl Registry {
    /// Build a registry from entries, keeping their order.
    #[must_use]
    pub fn new(entries: Vec<AircraftEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// The built-in fleet table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_FLEET
                .iter()
                .map(|(tail, id)| AircraftEntry::new(*tail, *id))
                .collect(),
        )
    }

    /// All entries in request order.
    #[must_use]
    pub fn entries(&self) -> &[AircraftEntry] {
        &self.entries
    }

    /// Number of aircraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no aircraft.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}
