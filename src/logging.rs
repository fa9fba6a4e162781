//! Structured logging for the rain alert service
//!
//! Thin layer over `tracing` that tags every event with the data source
//! it concerns and, where relevant, the monitored location. Provider
//! failures are classified so that expected outages log quieter than
//! real faults.

use std::fmt;

use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::model::{ForecastError, ProviderError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Geocoder,
    Forecast,
    Detector,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Geocoder => write!(f, "GEOCODE"),
            DataSource::Forecast => write!(f, "FORECAST"),
            DataSource::Detector => write!(f, "DETECT"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - e.g. the location simply does not resolve
    Expected,
    /// Unexpected failure - indicates provider degradation or misconfiguration
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `min_level` when set. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logger(min_level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::from(min_level).as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(source: DataSource, location: Option<&str>, message: &str) {
    tracing::info!(source = %source, location = location.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(source: DataSource, location: Option<&str>, message: &str) {
    tracing::warn!(source = %source, location = location.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(source: DataSource, location: Option<&str>, message: &str) {
    tracing::error!(source = %source, location = location.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(source: DataSource, location: Option<&str>, message: &str) {
    tracing::debug!(source = %source, location = location.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a provider failure by its error variant
pub fn classify_provider_failure(err: &ProviderError) -> FailureType {
    match err {
        // A typo'd or unknown location is a user-level problem, not an outage
        ProviderError::LocationNotFound(_) => FailureType::Expected,
        ProviderError::MissingApiKey(_) => FailureType::Unexpected,
        // 5xx and rate limiting come and go; other statuses mean a bad request or key
        ProviderError::Http(code) if *code >= 500 || *code == 429 => FailureType::Unknown,
        ProviderError::Http(_) => FailureType::Unexpected,
        ProviderError::Network(_) => FailureType::Unknown,
        // Parse errors suggest API changes or bugs
        ProviderError::Parse(_) => FailureType::Unexpected,
        ProviderError::Replay(_) => FailureType::Unexpected,
        ProviderError::Forecast(ForecastError::MalformedPayload(_)) => FailureType::Unexpected,
        ProviderError::Forecast(ForecastError::InvalidSampleOrder { .. }) => FailureType::Unexpected,
    }
}

/// Log a provider failure with automatic classification
pub fn log_provider_failure(
    source: DataSource,
    location: &str,
    operation: &str,
    err: &ProviderError,
) {
    let failure_type = classify_provider_failure(err);

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => info(source, Some(location), &message),
        FailureType::Unexpected => error(source, Some(location), &message),
        FailureType::Unknown => warn(source, Some(location), &message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_maps_to_tracing_level() {
        assert_eq!(Level::from(LogLevel::Warning), Level::WARN);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }

    #[test]
    fn test_failure_classification() {
        let not_found = ProviderError::LocationNotFound("zz99".to_string());
        assert_eq!(classify_provider_failure(&not_found), FailureType::Expected);

        let server_error = ProviderError::Http(503);
        assert_eq!(classify_provider_failure(&server_error), FailureType::Unknown);

        let forbidden = ProviderError::Http(403);
        assert_eq!(classify_provider_failure(&forbidden), FailureType::Unexpected);

        let malformed = ProviderError::Forecast(ForecastError::MalformedPayload("x".to_string()));
        assert_eq!(classify_provider_failure(&malformed), FailureType::Unexpected);
    }

    #[test]
    fn test_logging_without_subscriber_does_not_panic() {
        info(DataSource::System, None, "no subscriber installed");
        log_provider_failure(
            DataSource::Forecast,
            "rg248jz",
            "fetch forecast",
            &ProviderError::Network("timed out".to_string()),
        );
    }
}
