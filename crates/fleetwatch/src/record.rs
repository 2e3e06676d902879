//! Flight activity records.
//!
//! This module defines the raw records returned by the tracking service, the
//! normalized records the rest of the pipeline works with, and the derived
//! accessors a front-end uses to display them.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Placeholder shown for a missing callsign.
pub const UNKNOWN_CALLSIGN: &str = "Unknown";

/// Placeholder shown for a missing airport.
pub const UNKNOWN_AIRPORT: &str = "N/A";

/// Placeholder shown for a timestamp outside the representable range.
pub const INVALID_TIMESTAMP: &str = "invalid";

/// One activity record for one aircraft, as sent by the tracking service.
///
/// Only the fields the pipeline needs are decoded; anything else in the
/// payload is ignored. `first_seen <= last_seen` is expected but not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActivityRecord {
    /// Callsign broadcast during the flight.
    #[serde(default)]
    pub callsign: Option<String>,
    /// Estimated departure airport (ICAO code).
    #[serde(default, rename = "estDepartureAirport")]
    pub departure_airport: Option<String>,
    /// Estimated arrival airport (ICAO code).
    #[serde(default, rename = "estArrivalAirport")]
    pub arrival_airport: Option<String>,
    /// First time the aircraft was seen, Unix seconds.
    pub first_seen: i64,
    /// Last time the aircraft was seen, Unix seconds.
    pub last_seen: i64,
}

/// A raw record tagged with the tail number of the aircraft that flew it.
///
/// Records have no identity beyond their fields; two identical flights seen by
/// overlapping windows are two equal records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Tail number of the owning aircraft.
    pub tail_number: String,
    /// Callsign broadcast during the flight.
    pub callsign: Option<String>,
    /// Estimated departure airport.
    pub departure_airport: Option<String>,
    /// Estimated arrival airport.
    pub arrival_airport: Option<String>,
    /// First seen, Unix seconds.
    pub first_seen: i64,
    /// Last seen, Unix seconds.
    pub last_seen: i64,
}

/// Attach a tail number to a raw record.
#[must_use]
pub fn normalize(raw: RawActivityRecord, tail_number: &str) -> FlightRecord {
    FlightRecord {
        tail_number: tail_number.to_string(),
        callsign: raw.callsign,
        departure_airport: raw.departure_airport,
        arrival_airport: raw.arrival_airport,
        first_seen: raw.first_seen,
        last_seen: raw.last_seen,
    }
}

impl FlightRecord {
    /// Callsign for display, trimmed, or [`UNKNOWN_CALLSIGN`].
    #[must_use]
    pub fn callsign_label(&self) -> &str {
        label_or(self.callsign.as_deref(), UNKNOWN_CALLSIGN)
    }

    /// Departure airport for display, or [`UNKNOWN_AIRPORT`].
    #[must_use]
    pub fn departure_label(&self) -> &str {
        label_or(self.departure_airport.as_deref(), UNKNOWN_AIRPORT)
    }

    /// Arrival airport for display, or [`UNKNOWN_AIRPORT`].
    #[must_use]
    pub fn arrival_label(&self) -> &str {
        label_or(self.arrival_airport.as_deref(), UNKNOWN_AIRPORT)
    }

    /// How long the aircraft was seen for.
    #[must_use]
    pub fn duration(&self) -> FlightDuration {
        FlightDuration::between(self.first_seen, self.last_seen)
    }

    /// Local calendar date of departure.
    #[must_use]
    pub fn departure_date(&self) -> String {
        format_date(self.first_seen)
    }

    /// Local clock time of departure.
    #[must_use]
    pub fn departure_time(&self) -> String {
        format_time(self.first_seen)
    }
}

fn label_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

/// Elapsed whole minutes between two Unix timestamps.
///
/// Computed as `floor((last - first) / 60)`. A record whose last sighting
/// precedes its first yields a negative duration; it is not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FlightDuration {
    minutes: i64,
}

impl FlightDuration {
    /// Duration between `first_seen` and `last_seen`.
    #[must_use]
    pub fn between(first_seen: i64, last_seen: i64) -> Self {
        Self {
            minutes: last_seen.saturating_sub(first_seen).div_euclid(60),
        }
    }

    /// Total minutes, possibly negative.
    #[must_use]
    pub fn total_minutes(&self) -> i64 {
        self.minutes
    }

    /// Whole hours component.
    #[must_use]
    pub fn hours(&self) -> i64 {
        self.minutes / 60
    }

    /// Minutes component left after whole hours; carries the sign of the total.
    #[must_use]
    pub fn minutes(&self) -> i64 {
        self.minutes % 60
    }
}

impl fmt::Display for FlightDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours(), self.minutes())
    }
}

/// Local calendar date (`YYYY-MM-DD`) of a Unix timestamp.
#[must_use]
pub fn format_date(ts: i64) -> String {
    format_date_in(ts, &Local)
}

/// Local clock time (`HH:MM`) of a Unix timestamp.
#[must_use]
pub fn format_time(ts: i64) -> String {
    format_time_in(ts, &Local)
}

/// Calendar date of a Unix timestamp in the given zone.
///
/// Timestamps chrono cannot represent render as [`INVALID_TIMESTAMP`].
#[must_use]
pub fn format_date_in<Tz: TimeZone>(ts: i64, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    format_in(ts, tz, "%Y-%m-%d")
}

/// Clock time of a Unix timestamp in the given zone.
#[must_use]
pub fn format_time_in<Tz: TimeZone>(ts: i64, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    format_in(ts, tz, "%H:%M")
}

fn format_in<Tz: TimeZone>(ts: i64, tz: &Tz, pattern: &str) -> String
where
    Tz::Offset: fmt::Display,
{
    DateTime::from_timestamp(ts, 0).map_or_else(
        || INVALID_TIMESTAMP.to_string(),
        |utc| utc.with_timezone(tz).format(pattern).to_string(),
    )
}
