//! Retrieval of activity records from the tracking service.
//!
//! [`ActivitySource`] is the seam between the scheduler and the network. The
//! production implementation, [`OpenSkySource`], issues one
//! `GET <base>/flights/aircraft` request per call; tests substitute scripted
//! sources.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::RawActivityRecord;

/// Default base URL of the tracking service.
pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";

/// The `[start, end)` time range queried for every aircraft in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryWindow {
    start: i64,
    end: i64,
}

impl QueryWindow {
    /// Create a window from Unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] unless `start < end`.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(Error::InvalidWindow { start, end })
        }
    }

    /// The window of length `span` that ends at `end`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if `span` rounds to zero seconds.
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Result<Self> {
        let end = end.timestamp();
        let span = i64::try_from(span.as_secs()).unwrap_or(i64::MAX);
        Self::new(end.saturating_sub(span), end)
    }

    /// Window start, Unix seconds.
    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Window end, Unix seconds.
    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }
}

/// Something that can report the flights of one aircraft over a window.
#[async_trait::async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch the raw activity records of `tracker_id` within `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the records could not be retrieved or decoded.
    /// Callers isolate this error to the one aircraft.
    async fn fetch(&self, tracker_id: &str, window: QueryWindow)
        -> Result<Vec<RawActivityRecord>>;
}

/// Settings for [`OpenSkySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Base URL, without a trailing `/flights/...` path.
    pub base_url: String,
    /// Per-request timeout; `None` keeps the HTTP client's default.
    pub request_timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            user_agent: concat!("fleetwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`ActivitySource`] backed by an OpenSky-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenSkySource {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenSkySource {
    /// Build a source from settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientBuild`] if the HTTP client cannot be created.
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(settings.user_agent.clone());
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::ClientBuild)?;
        Ok(Self::with_client(client, &settings.base_url))
    }

    /// Build a source around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/flights/aircraft", base_url.trim_end_matches('/')),
        }
    }

    /// The full endpoint URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ActivitySource for OpenSkySource {
    async fn fetch(
        &self,
        tracker_id: &str,
        window: QueryWindow,
    ) -> Result<Vec<RawActivityRecord>> {
        debug!(
            tracker_id,
            begin = window.start(),
            end = window.end(),
            "Requesting flights"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("icao24", tracker_id.to_string()),
                ("begin", window.start().to_string()),
                ("end", window.end().to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::transport(tracker_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream_status(tracker_id, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(tracker_id, e))?;
        let records: Vec<RawActivityRecord> =
            serde_json::from_slice(&body).map_err(|e| Error::malformed_body(tracker_id, e))?;

        debug!(tracker_id, count = records.len(), "Received flights");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_new() {
        let window = QueryWindow::new(100, 200).unwrap();
        assert_eq!(window.start(), 100);
        assert_eq!(window.end(), 200);
    }

    #[test]
    fn test_window_rejects_empty_and_inverted() {
        assert!(matches!(
            QueryWindow::new(200, 200),
            Err(Error::InvalidWindow { .. })
        ));
        assert!(QueryWindow::new(300, 200).is_err());
    }

    #[test]
    fn test_window_ending_at() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let window = QueryWindow::ending_at(end, Duration::from_secs(24 * 60 * 60)).unwrap();
        assert_eq!(window.end(), 1_700_000_000);
        assert_eq!(window.start(), 1_700_000_000 - 86_400);
    }

    #[test]
    fn test_window_ending_at_zero_span() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(QueryWindow::ending_at(end, Duration::from_millis(500)).is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let source = OpenSkySource::with_client(reqwest::Client::new(), "http://localhost:1/api/");
        assert_eq!(source.endpoint(), "http://localhost:1/api/flights/aircraft");
    }

    #[test]
    fn test_default_settings() {
        let settings = SourceSettings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert!(settings.request_timeout.is_none());
        assert!(settings.user_agent.starts_with("fleetwatch/"));
    }

    #[test]
    fn test_new_builds_client() {
        let settings = SourceSettings {
            request_timeout: Some(Duration::from_secs(5)),
            ..SourceSettings::default()
        };
        let source = OpenSkySource::new(&settings).unwrap();
        assert!(source.endpoint().ends_with("/flights/aircraft"));
    }
}
