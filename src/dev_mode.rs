//! Development mode utilities for working without live providers
//!
//! When API keys or network access are unavailable, use this module to
//! replay a captured forecast payload from disk and pin the location to
//! fixed coordinates. The rest of the pipeline runs unchanged.

use std::path::{Path, PathBuf};

use crate::ingest::forecast::{parse_forecast_response, ForecastPayload};
use crate::ingest::{ForecastSource, Geocoder};
use crate::model::{Coordinates, GeocodedLocation, ProviderError};

/// Forecast source that replays a saved provider response.
pub struct DevMode {
    /// Path to a JSON body captured from the forecast provider
    pub payload_path: PathBuf,
}

impl DevMode {
    /// Create a new dev mode source
    ///
    /// # Arguments
    /// * `payload_path` - JSON file holding a provider response body
    pub fn new(payload_path: impl Into<PathBuf>) -> Self {
        Self {
            payload_path: payload_path.into(),
        }
    }

    /// Reads and parses the captured payload
    pub fn load_payload(&self) -> Result<ForecastPayload, ProviderError> {
        let body = read_body(&self.payload_path)?;
        parse_forecast_response(&body)
    }
}

impl ForecastSource for DevMode {
    /// Coordinates are ignored; the captured payload is returned as-is.
    fn fetch(&self, _coordinates: Coordinates) -> Result<ForecastPayload, ProviderError> {
        self.load_payload()
    }
}

fn read_body(path: &Path) -> Result<String, ProviderError> {
    std::fs::read_to_string(path)
        .map_err(|e| ProviderError::Replay(format!("failed to read {}: {}", path.display(), e)))
}

/// Geocoder that resolves every location to the same coordinates.
pub struct FixedGeocoder {
    pub coordinates: Coordinates,
}

impl FixedGeocoder {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            coordinates: Coordinates { lat, lng },
        }
    }
}

impl Geocoder for FixedGeocoder {
    fn geocode(&self, location: &str) -> Result<GeocodedLocation, ProviderError> {
        Ok(GeocodedLocation {
            coordinates: self.coordinates,
            formatted_address: Some(location.to_string()),
            locality: None,
        })
    }
}
