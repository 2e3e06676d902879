//! `fleetwatch` - Recent flight activity and estimated revenue for a fleet
//!
//! This library fetches the last day of flight activity for a fixed set of
//! aircraft from an OpenSky-compatible tracking service, one rate-limited
//! request at a time, merges the results newest first, and derives flight
//! count and revenue metrics for display.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod source;

#[cfg(test)]
mod test_support;

pub use aggregate::{merge, AggregatedView};
pub use config::Config;
pub use controller::{ControllerState, DashboardSnapshot, RefreshController, RefreshOutcome};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use metrics::{compute, Metrics, RateSetting};
pub use record::{normalize, FlightRecord, RawActivityRecord};
pub use registry::{AircraftEntry, Registry};
pub use scheduler::{FetchOutcome, Scheduler, SessionReport, SourceReport};
pub use source::{ActivitySource, OpenSkySource, QueryWindow};
