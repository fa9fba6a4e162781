//! Core data types for the rain alert service.
//!
//! This module defines the shared domain model imported by all other modules:
//! normalized forecast samples, current conditions, the onset result, and the
//! error types surfaced by the normalizer, detector and provider clients.
//! It contains no I/O.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Precipitation type
// ---------------------------------------------------------------------------

/// Generic label used in messages when the provider did not classify the
/// precipitation.
pub const GENERIC_PRECIP_LABEL: &str = "Precipitation";

/// Precipitation type as reported per minute by the forecast provider.
///
/// The provider omits the field when probability is zero, so an absent or
/// empty string maps to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecipType {
    #[default]
    None,
    Rain,
    Snow,
    Sleet,
    Unknown,
}

impl PrecipType {
    /// Parses a provider string. Case-insensitive; unrecognized non-empty
    /// strings become `Unknown`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("none") => PrecipType::None,
            Some("rain") => PrecipType::Rain,
            Some("snow") => PrecipType::Snow,
            Some("sleet") => PrecipType::Sleet,
            Some(_) => PrecipType::Unknown,
        }
    }

    /// Canonical lowercase name. Empty for `None`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrecipType::None => "",
            PrecipType::Rain => "rain",
            PrecipType::Snow => "snow",
            PrecipType::Sleet => "sleet",
            PrecipType::Unknown => "unknown",
        }
    }

    /// The token used at the start of an onset message. Never empty.
    pub fn label(&self) -> String {
        match self {
            PrecipType::Rain | PrecipType::Snow | PrecipType::Sleet => {
                crate::alert::onset::title_case(self.as_str())
            }
            PrecipType::None | PrecipType::Unknown => GENERIC_PRECIP_LABEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized forecast types
// ---------------------------------------------------------------------------

/// One minute-level data point from the provider's short-horizon forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub precipitation_probability: f64, // 0.0..=1.0
    pub precipitation_intensity: f64,   // provider units, e.g. mm/h
    pub precipitation_type: PrecipType,
}

impl ForecastSample {
    /// Builds a sample from a Unix timestamp in seconds. Returns `None` if
    /// the timestamp is outside chrono's representable range.
    pub fn from_epoch(
        epoch_secs: i64,
        precipitation_probability: f64,
        precipitation_intensity: f64,
        precipitation_type: PrecipType,
    ) -> Option<Self> {
        let timestamp = Utc.timestamp_opt(epoch_secs, 0).single()?;
        Some(ForecastSample {
            timestamp,
            precipitation_probability,
            precipitation_intensity,
            precipitation_type,
        })
    }
}

/// Snapshot of ambient conditions at the anchor time.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub precipitation_probability: f64,
    /// Provider summary text, reported when no onset is detected.
    pub fallback_summary: String,
}

// ---------------------------------------------------------------------------
// Detection result
// ---------------------------------------------------------------------------

/// Data for the first alert-worthy minute in the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Onset {
    /// Minutes between the anchor sample and the qualifying sample.
    pub lead_minutes: f64,
    pub precip_type: PrecipType,
    pub intensity: f64,
    pub probability: f64,
    pub message: String,
}

/// Outcome of a single detection call.
#[derive(Debug, Clone, PartialEq)]
pub enum OnsetResult {
    /// Already precipitating by the ambient measure, or nothing in the
    /// horizon crosses the threshold.
    NoOnset { summary: String },
    OnsetFound(Onset),
}

impl OnsetResult {
    /// The single human-readable string reported to the caller.
    pub fn text(&self) -> &str {
        match self {
            OnsetResult::NoOnset { summary } => summary,
            OnsetResult::OnsetFound(onset) => &onset.message,
        }
    }

    pub fn onset(&self) -> Option<&Onset> {
        match self {
            OnsetResult::OnsetFound(onset) => Some(onset),
            OnsetResult::NoOnset { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Location types
// ---------------------------------------------------------------------------

/// WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Result of resolving a free-text location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub coordinates: Coordinates,
    pub formatted_address: Option<String>,
    /// Postal town, locality or route name, whichever the geocoder reported
    /// first. Used for log context only.
    pub locality: Option<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the normalizer and detector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// The raw payload lacks a required field or carries an invalid value.
    #[error("Malformed forecast payload: {0}")]
    MalformedPayload(String),
    /// A sample's timestamp is earlier than the one before it.
    #[error("Sample {index} at {found} precedes previous sample at {previous}")]
    InvalidSampleOrder {
        index: usize,
        previous: DateTime<Utc>,
        found: DateTime<Utc>,
    },
}

/// Errors raised while talking to the geocoding or forecast collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The named environment variable holding the API key is not set.
    #[error("Missing API key: {0} is not set")]
    MissingApiKey(&'static str),
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// Connection failure, timeout or similar transport problem.
    #[error("Network error: {0}")]
    Network(String),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The geocoder returned no result for the location string.
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    /// A captured payload could not be read in dev mode.
    #[error("Replay error: {0}")]
    Replay(String),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// The request URL carries API keys, so it is dropped before the error is
/// rendered.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        match err.status() {
            Some(status) => ProviderError::Http(status.as_u16()),
            None if err.is_decode() => ProviderError::Parse(err.to_string()),
            None => ProviderError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
