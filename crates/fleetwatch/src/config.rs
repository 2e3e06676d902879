//! Configuration management for fleetwatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::DEFAULT_REVENUE_PER_FLIGHT;
use crate::registry::{AircraftEntry, Registry};
use crate::source::{SourceSettings, DEFAULT_BASE_URL};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "fleetwatch";

/// ICAO24 addresses are 24-bit values written as six hex digits.
const TRACKER_ID_PATTERN: &str = r"^[0-9a-fA-F]{6}$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLEETWATCH_`)
/// 2. TOML config file at `~/.config/fleetwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream tracking service configuration.
    pub upstream: UpstreamConfig,
    /// Request scheduling configuration.
    pub schedule: ScheduleConfig,
    /// Revenue estimation configuration.
    pub revenue: RevenueConfig,
    /// Fleet configuration.
    pub fleet: FleetConfig,
}

/// Upstream-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the tracking service API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    /// Unset keeps the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` header sent with requests.
    pub user_agent: String,
}

/// Scheduling-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minimum spacing between upstream requests in milliseconds.
    pub request_spacing_ms: u64,
    /// Length of the query window in hours.
    pub window_hours: u32,
    /// Period of the displayed clock in seconds.
    pub clock_tick_secs: u64,
}

/// Revenue-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueConfig {
    /// Estimated revenue per flight.
    pub per_flight: Decimal,
}

/// Fleet-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Aircraft to track, in request order.
    /// Empty uses the built-in fleet.
    pub aircraft: Vec<AircraftEntry>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let source = SourceSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None, // Transport default
            user_agent: source.user_agent,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            request_spacing_ms: 500,
            window_hours: 24,
            clock_tick_secs: 60,
        }
    }
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            per_flight: DEFAULT_REVENUE_PER_FLIGHT,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLEETWATCH_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLEETWATCH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist.
    ///
    /// Unlike [`Config::load_from`], a missing file is an error rather than a
    /// fallback to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable, or invalid.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(invalid(format!("{} does not exist", path.display())));
        }
        Self::load_from(Some(path.to_path_buf()))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        // Validate upstream config
        let base = self.upstream.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.upstream.base_url
            )));
        }

        if self.upstream.request_timeout_secs == Some(0) {
            return Err(invalid("request_timeout_secs must be greater than 0"));
        }

        // Validate schedule config
        if self.schedule.request_spacing_ms == 0 {
            return Err(invalid("request_spacing_ms must be greater than 0"));
        }

        if self.schedule.window_hours == 0 {
            return Err(invalid("window_hours must be greater than 0"));
        }

        if self.schedule.clock_tick_secs == 0 {
            return Err(invalid("clock_tick_secs must be greater than 0"));
        }

        // Validate revenue config
        if self.revenue.per_flight.is_sign_negative() && !self.revenue.per_flight.is_zero() {
            return Err(invalid(format!(
                "per_flight must not be negative, got {}",
                self.revenue.per_flight
            )));
        }

        // Validate fleet
        let tracker_id = Regex::new(TRACKER_ID_PATTERN)
            .map_err(|e| Error::internal(format!("tracker id pattern: {e}")))?;
        let mut tails = HashSet::new();
        for entry in &self.fleet.aircraft {
            if !tracker_id.is_match(&entry.tracker_id) {
                return Err(invalid(format!(
                    "tracker_id '{}' for {} must be six hex digits",
                    entry.tracker_id, entry.tail_number
                )));
            }
            if !tails.insert(entry.tail_number.as_str()) {
                return Err(invalid(format!(
                    "duplicate tail_number: {}",
                    entry.tail_number
                )));
            }
        }

        Ok(())
    }

    /// Get the registry to fetch, resolving to the built-in fleet if unset.
    #[must_use]
    pub fn registry(&self) -> Registry {
        if self.fleet.aircraft.is_empty() {
            Registry::builtin()
        } else {
            Registry::new(self.fleet.aircraft.clone())
        }
    }

    /// Get the settings for the upstream source.
    #[must_use]
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            base_url: self.upstream.base_url.trim().to_string(),
            request_timeout: self.upstream.request_timeout_secs.map(Duration::from_secs),
            user_agent: self.upstream.user_agent.clone(),
        }
    }

    /// Get the request spacing as a Duration.
    #[must_use]
    pub fn request_spacing(&self) -> Duration {
        Duration::from_millis(self.schedule.request_spacing_ms)
    }

    /// Get the query window length as a Duration.
    #[must_use]
    pub fn window_span(&self) -> Duration {
        Duration::from_secs(u64::from(self.schedule.window_hours) * 60 * 60)
    }

    /// Get the clock tick period as a Duration.
    #[must_use]
    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.schedule.clock_tick_secs)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert!(config.upstream.request_timeout_secs.is_none());
        assert_eq!(config.revenue.per_flight, Decimal::from(70_329));
        assert!(config.fleet.aircraft.is_empty());
    }

    #[test]
    fn test_default_schedule_config() {
        let schedule = ScheduleConfig::default();

        assert_eq!(schedule.request_spacing_ms, 500);
        assert_eq!(schedule.window_hours, 24);
        assert_eq!(schedule.clock_tick_secs, 60);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.upstream.base_url = "opensky-network.org/api".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.upstream.request_timeout_secs = Some(0);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("request_timeout_secs"));
    }

    #[test]
    fn test_validate_zero_spacing() {
        let mut config = Config::default();
        config.schedule.request_spacing_ms = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("request_spacing_ms"));
    }

    #[test]
    fn test_validate_zero_window() {
        let mut config = Config::default();
        config.schedule.window_hours = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("window_hours"));
    }

    #[test]
    fn test_validate_zero_tick() {
        let mut config = Config::default();
        config.schedule.clock_tick_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("clock_tick_secs"));
    }

    #[test]
    fn test_validate_negative_rate() {
        let mut config = Config::default();
        config.revenue.per_flight = Decimal::from(-1);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("per_flight"));
    }

    #[test]
    fn test_validate_bad_tracker_id() {
        let mut config = Config::default();
        config.fleet.aircraft = vec![AircraftEntry::new("N1", "xyz")];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("six hex digits"));
    }

    #[test]
    fn test_validate_duplicate_tail() {
        let mut config = Config::default();
        config.fleet.aircraft = vec![
            AircraftEntry::new("N1", "abc123"),
            AircraftEntry::new("N1", "abc124"),
        ];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_registry_default_is_builtin() {
        let config = Config::default();
        assert_eq!(config.registry(), Registry::builtin());
    }

    #[test]
    fn test_registry_override() {
        let mut config = Config::default();
        config.fleet.aircraft = vec![
            AircraftEntry::new("N2", "00000b"),
            AircraftEntry::new("N1", "00000a"),
        ];

        let registry = config.registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entries()[0].tail_number, "N2");
    }

    #[test]
    fn test_source_settings() {
        let mut config = Config::default();
        config.upstream.base_url = " http://localhost:8080/api ".to_string();
        config.upstream.request_timeout_secs = Some(10);

        let settings = config.source_settings();
        assert_eq!(settings.base_url, "http://localhost:8080/api");
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.request_spacing(), Duration::from_millis(500));
        assert_eq!(config.window_span(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.clock_tick(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("fleetwatch"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("fleetwatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[schedule]
request_spacing_ms = 750

[revenue]
per_flight = 1000

[[fleet.aircraft]]
tail_number = "N77"
tracker_id = "a1b2c3"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.schedule.request_spacing_ms, 750);
        assert_eq!(config.schedule.window_hours, 24);
        assert_eq!(config.revenue.per_flight, Decimal::from(1000));
        assert_eq!(config.registry().entries()[0].tail_number, "N77");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_toml_file_validates_sections() {
        let dir = std::env::temp_dir().join(format!("fleetwatch-invalid-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[revenue]
per_flight = 5

[[fleet.aircraft]]
tail_number = "N1"
tracker_id = "zzzzzz"
"#,
        )
        .unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("zzzzzz"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_toml_file_upstream_and_revenue() {
        let dir = std::env::temp_dir().join(format!("fleetwatch-upstream-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[upstream]
base_url = "http://localhost:8080/api"

[revenue]
per_flight = 5
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.upstream.base_url, "http://localhost:8080/api");
        assert_eq!(config.revenue.per_flight, Decimal::from(5));
        assert_eq!(config.registry(), Registry::builtin());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_file_requires_existing_file() {
        let err = Config::load_file(Path::new("/nonexistent/fleetwatch.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_load_file_reports_broken_file() {
        let dir = std::env::temp_dir().join(format!("fleetwatch-broken-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.toml");
        std::fs::write(&broken, "[schedule]\nrequest_spacing_ms = 0\n").unwrap();
        let good = dir.join("good.toml");
        std::fs::write(&good, "[schedule]\nrequest_spacing_ms = 250\n").unwrap();

        let err = Config::load_file(&broken).unwrap_err();
        assert!(err.to_string().contains("request_spacing_ms"));

        // A broken file elsewhere does not affect checking another one.
        let config = Config::load_file(&good).unwrap();
        assert_eq!(config.schedule.request_spacing_ms, 250);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_schedule_config_deserialize() {
        let json = r#"{"request_spacing_ms": 1000}"#;
        let schedule: ScheduleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.request_spacing_ms, 1000);
        assert_eq!(schedule.window_hours, 24);
    }

    #[test]
    fn test_revenue_config_serialize() {
        let revenue = RevenueConfig::default();
        let json = serde_json::to_string(&revenue).unwrap();
        assert!(json.contains("per_flight"));
        assert!(json.contains("70329"));
    }
}
