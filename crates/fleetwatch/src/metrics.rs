//! Derived operational metrics.
//!
//! Revenue is `flight_count × rate` computed with exact decimal arithmetic.
//! The rate lives in a [`RateSetting`] owned by whoever drives the pipeline;
//! [`compute`] itself is a pure function of the view and a rate.

use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::AggregatedView;
use crate::error::{Error, Result};

/// Default estimated revenue per flight.
pub const DEFAULT_REVENUE_PER_FLIGHT: Decimal = Decimal::from_parts(70_329, 0, 0, false, 0);

/// Metrics for one aggregated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Number of flights in the view.
    pub flight_count: usize,
    /// Rate the revenue was computed with.
    pub revenue_per_flight: Decimal,
    /// `flight_count × revenue_per_flight`.
    pub total_revenue: Decimal,
}

/// Compute metrics for a view at the given rate.
///
/// A product too large for [`Decimal`] saturates at [`Decimal::MAX`].
#[must_use]
pub fn compute(view: &AggregatedView, rate: Decimal) -> Metrics {
    let flight_count = view.len();
    let total_revenue = Decimal::from(flight_count)
        .checked_mul(rate)
        .unwrap_or(Decimal::MAX);
    Metrics {
        flight_count,
        revenue_per_flight: rate,
        total_revenue,
    }
}

/// Parse a per-flight rate from user input.
///
/// # Errors
///
/// Returns [`Error::InvalidRate`] if the input is not a decimal number or is
/// negative.
pub fn parse_rate(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    let rate = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| Error::invalid_rate(input, e.to_string()))?;
    validate_rate(rate).map_err(|reason| Error::invalid_rate(input, reason))
}

fn validate_rate(rate: Decimal) -> std::result::Result<Decimal, &'static str> {
    if rate.is_sign_negative() && !rate.is_zero() {
        Err("rate must not be negative")
    } else {
        Ok(rate)
    }
}

/// The current per-flight rate, shared between a configuration surface and
/// the readers that render metrics.
///
/// Invalid updates are dropped and the previous rate is kept.
#[derive(Debug)]
pub struct RateSetting {
    rate: RwLock<Decimal>,
}

impl RateSetting {
    /// Create a setting with an initial rate.
    ///
    /// A negative initial rate is replaced by the default.
    #[must_use]
    pub fn new(initial: Decimal) -> Self {
        let rate = validate_rate(initial).unwrap_or(DEFAULT_REVENUE_PER_FLIGHT);
        Self {
            rate: RwLock::new(rate),
        }
    }

    /// The current rate.
    #[must_use]
    pub fn get(&self) -> Decimal {
        *self.rate.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the rate from user input.
    ///
    /// Returns `true` if the input was accepted. Rejected input leaves the
    /// previous rate in place.
    pub fn set_from_str(&self, input: &str) -> bool {
        match parse_rate(input) {
            Ok(rate) => {
                self.store(rate);
                true
            }
            Err(e) => {
                debug!("Keeping revenue rate {}: {e}", self.get());
                false
            }
        }
    }

    /// Replace the rate with a decimal value.
    ///
    /// Returns `true` if the value was accepted.
    pub fn set(&self, rate: Decimal) -> bool {
        match validate_rate(rate) {
            Ok(rate) => {
                self.store(rate);
                true
            }
            Err(reason) => {
                debug!("Keeping revenue rate {}: {reason}", self.get());
                false
            }
        }
    }

    /// Metrics for `view` at the current rate.
    #[must_use]
    pub fn metrics_for(&self, view: &AggregatedView) -> Metrics {
        compute(view, self.get())
    }

    fn store(&self, rate: Decimal) {
        *self.rate.write().unwrap_or_else(PoisonError::into_inner) = rate;
    }
}

impl Default for RateSetting {
    fn default() -> Self {
        Self::new(DEFAULT_REVENUE_PER_FLIGHT)
    }
}
