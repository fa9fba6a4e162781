//! Service configuration.
//!
//! Settings live in a TOML file (default `rainalert.toml`); every section
//! is optional and falls back to the defaults below. API keys are never
//! read from the file: they come from the environment, optionally via a
//! `.env` file, and are passed explicitly into the provider clients.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::alert::DetectorPolicy;
use crate::logging::LogLevel;
use crate::model::ProviderError;

/// Environment variable holding the Google Geocoding API key.
pub const MAPS_KEY_VAR: &str = "RAINALERT_MAPS_KEY";
/// Environment variable holding the forecast provider API key.
pub const FORECAST_KEY_VAR: &str = "RAINALERT_FORECAST_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "rainalert.toml";

const DEFAULT_GEOCODER_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_FORECAST_URL: &str = "https://api.pirateweather.net";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Free-text location to monitor, e.g. a postcode.
    pub location: String,
    pub detector: DetectorPolicy,
    pub geocoder: GeocoderConfig,
    pub forecast: ForecastConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        GeocoderConfig {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Provider unit system (`us`, `si`, `ca`, `uk2`). Provider default when unset.
    pub units: Option<String>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            base_url: DEFAULT_FORECAST_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            units: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Config {
    /// Reads, parses and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file without validating it, so that
    /// command-line overrides can be applied first.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies command-line overrides. `None` leaves the file value in place.
    pub fn apply_overrides(&mut self, location: Option<String>, threshold: Option<f64>) {
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(threshold) = threshold {
            self.detector.threshold = threshold;
        }
    }

    /// Parses and validates TOML config text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.location.trim().is_empty() {
            return Err(ConfigError::Invalid("`location` must not be empty".to_string()));
        }
        let threshold = self.detector.threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "`detector.threshold` must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.geocoder.timeout_secs == 0 || self.forecast.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// Credentials for the external collaborators.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub maps: Option<String>,
    pub forecast: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("maps", &redact(&self.maps))
            .field("forecast", &redact(&self.forecast))
            .finish()
    }
}

impl ApiKeys {
    /// Loads keys from the process environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads keys through an arbitrary lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        ApiKeys {
            maps: get(MAPS_KEY_VAR),
            forecast: get(FORECAST_KEY_VAR),
        }
    }

    pub fn require_maps(&self) -> Result<&str, ProviderError> {
        self.maps.as_deref().ok_or(ProviderError::MissingApiKey(MAPS_KEY_VAR))
    }

    pub fn require_forecast(&self) -> Result<&str, ProviderError> {
        self.forecast.as_deref().ok_or(ProviderError::MissingApiKey(FORECAST_KEY_VAR))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
