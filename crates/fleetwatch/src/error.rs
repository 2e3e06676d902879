//! Error types for fleetwatch.
//!
//! This module defines all error types used throughout the fleetwatch crate,
//! providing detailed context for debugging and user-friendly error messages.

use thiserror::Error;

/// The main error type for fleetwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Upstream Errors ===
    /// The HTTP request to the tracking service could not be completed.
    #[error("request for aircraft {tracker_id} failed: {source}")]
    Transport {
        /// Tracker id the request was issued for.
        tracker_id: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The tracking service answered with a non-success status.
    #[error("upstream returned status {status} for aircraft {tracker_id}")]
    UpstreamStatus {
        /// Tracker id the request was issued for.
        tracker_id: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded into activity records.
    #[error("malformed response for aircraft {tracker_id}: {source}")]
    MalformedBody {
        /// Tracker id the request was issued for.
        tracker_id: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    // === Pipeline Errors ===
    /// A query window whose start is not strictly before its end.
    #[error("invalid query window: start {start} is not before end {end}")]
    InvalidWindow {
        /// Window start, Unix seconds.
        start: i64,
        /// Window end, Unix seconds.
        end: i64,
    },

    /// A per-flight revenue rate that is negative or not a number.
    #[error("invalid revenue rate '{input}': {reason}")]
    InvalidRate {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A fetch session ended without producing a view.
    #[error("fetch session failed: {0}")]
    Session(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for fleetwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a transport error for the given aircraft.
    #[must_use]
    pub fn transport(tracker_id: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            tracker_id: tracker_id.into(),
            source,
        }
    }

    /// Create an upstream status error for the given aircraft.
    #[must_use]
    pub fn upstream_status(tracker_id: impl Into<String>, status: u16) -> Self {
        Self::UpstreamStatus {
            tracker_id: tracker_id.into(),
            status,
        }
    }

    /// Create a malformed body error for the given aircraft.
    #[must_use]
    pub fn malformed_body(tracker_id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedBody {
            tracker_id: tracker_id.into(),
            source,
        }
    }

    /// Create an invalid rate error.
    #[must_use]
    pub fn invalid_rate(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a session failure error.
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error came from talking to the tracking service.
    ///
    /// These are the errors isolated to a single aircraft.
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::UpstreamStatus { .. } | Self::MalformedBody { .. }
        )
    }
}
