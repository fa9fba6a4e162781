//! Clients for the external collaborators: the geocoder that turns a
//! location string into coordinates, and the forecast provider that
//! returns the raw minute-level payload.
//!
//! Submodules:
//! - `geocode`  - Google Geocoding API client.
//! - `forecast` - Dark-Sky-compatible forecast API client and raw payload types.

pub mod forecast;
pub mod geocode;

use crate::model::{Coordinates, GeocodedLocation, ProviderError};
use forecast::ForecastPayload;

/// Resolves a free-text location (address, postcode) to coordinates.
pub trait Geocoder {
    fn geocode(&self, location: &str) -> Result<GeocodedLocation, ProviderError>;
}

/// Fetches the raw forecast payload for a coordinate pair.
pub trait ForecastSource {
    fn fetch(&self, coordinates: Coordinates) -> Result<ForecastPayload, ProviderError>;
}

/// Builds the blocking HTTP client shared by both provider clients.
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(ProviderError::from)
}
