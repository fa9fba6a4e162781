//! Google Geocoding API client.
//!
//! Resolves the configured location string (a postcode or address) to a
//! coordinate pair. Only `geometry.location`, `formatted_address` and the
//! address components used for log context are deserialized.
//!
//! API Documentation: https://developers.google.com/maps/documentation/geocoding/requests-geocoding

use serde::Deserialize;

use super::Geocoder;
use crate::config::GeocoderConfig;
use crate::model::{Coordinates, GeocodedLocation, ProviderError};

/// Address component types tried, in order, when picking a locality label.
const LOCALITY_COMPONENTS: &[&str] = &["postal_town", "locality", "route"];

// ============================================================================
// Raw response structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

// ============================================================================
// API client
// ============================================================================

/// Blocking client for the Google Geocoding API.
pub struct GoogleGeocoder {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocoderConfig, api_key: String) -> Result<Self, ProviderError> {
        Ok(GoogleGeocoder {
            http: super::build_http_client(config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&self, location: &str) -> Result<GeocodedLocation, ProviderError> {
        // reqwest handles the URL-encoding of free-text addresses.
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("address", location), ("key", self.api_key.as_str())])
            .send()?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(response.status().as_u16()));
        }

        let body = response.text()?;
        parse_geocode_response(&body, location)
    }
}

/// Parses a geocoding response body and picks the first result.
///
/// `ZERO_RESULTS`, any other non-`OK` status, or an empty result list all
/// map to `LocationNotFound`.
pub fn parse_geocode_response(body: &str, location: &str) -> Result<GeocodedLocation, ProviderError> {
    let response: GeocodeResponse = serde_json::from_str(body)?;

    if response.status != "OK" {
        let detail = response
            .error_message
            .map(|m| format!("{} ({}): {}", location, response.status, m))
            .unwrap_or_else(|| format!("{} ({})", location, response.status));
        return Err(ProviderError::LocationNotFound(detail));
    }

    let first = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::LocationNotFound(location.to_string()))?;

    let locality = pick_locality(&first.address_components);

    Ok(GeocodedLocation {
        coordinates: Coordinates {
            lat: first.geometry.location.lat,
            lng: first.geometry.location.lng,
        },
        formatted_address: first.formatted_address,
        locality,
    })
}

fn pick_locality(components: &[AddressComponent]) -> Option<String> {
    LOCALITY_COMPONENTS.iter().find_map(|wanted| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted))
            .map(|c| c.long_name.clone())
    })
}

// ============================================================================
// Tests
// ============================================================================
