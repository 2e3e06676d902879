//! Logging configuration for fleetwatch.
//!
//! The library only emits `tracing` events; the binary installs the
//! subscriber. Log lines go to stderr so that `--json` output on stdout stays
//! machine-readable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Session start/end and per-aircraft failures.
    #[default]
    Normal,
    /// Every request.
    Verbose,
    /// Everything, including clock ticks.
    Trace,
}

impl Verbosity {
    /// Map `-q` and a `-v` count to a verbosity. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level that is still shown.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    ///
    /// HTTP client internals stay at `warn` unless tracing everything.
    #[must_use]
    pub fn directive(&self) -> String {
        let dependencies = if *self == Self::Trace { "trace" } else { "warn" };
        format!("{dependencies},fleetwatch={}", self.level())
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG`, when set, replaces the filter derived from `verbosity`.
/// Calling this more than once is harmless; only the first call installs a
/// subscriber.
///
/// ```no_run
/// use fleetwatch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity != Verbosity::Normal)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}
