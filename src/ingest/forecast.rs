//! Forecast provider client.
//!
//! Talks to a Dark-Sky-compatible forecast API (the default base URL points
//! at Pirate Weather, which serves the same response shape). Only the
//! `currently` and `minutely` blocks are requested and deserialized; the
//! hourly/daily/alerts/flags blocks are excluded in the request and every
//! other field in the kept blocks is ignored.
//!
//! Request shape: `{base_url}/forecast/{key}/{lat},{lng}?exclude=...`

use serde::Deserialize;

use super::ForecastSource;
use crate::config::ForecastConfig;
use crate::model::{Coordinates, ProviderError};

/// Blocks detection never reads.
const EXCLUDED_BLOCKS: &str = "hourly,daily,alerts,flags";

// ============================================================================
// Raw response structures
// ============================================================================

/// The subset of the provider's response the normalizer reads.
///
/// Every field is optional here so that a missing block surfaces as a
/// `MalformedPayload` from the normalizer instead of a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    pub currently: Option<RawCurrently>,
    pub minutely: Option<RawMinutely>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCurrently {
    pub summary: Option<String>,
    pub precip_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMinutely {
    pub summary: Option<String>,
    pub data: Option<Vec<RawMinute>>,
}

/// One entry of `minutely.data`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMinute {
    pub time: Option<i64>,
    pub precip_probability: Option<f64>,
    pub precip_intensity: Option<f64>,
    pub precip_type: Option<String>,
}

// ============================================================================
// API client
// ============================================================================

/// Blocking client for the forecast API.
pub struct DarkSkyClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    units: Option<String>,
}

impl DarkSkyClient {
    pub fn new(config: &ForecastConfig, api_key: String) -> Result<Self, ProviderError> {
        Ok(DarkSkyClient {
            http: super::build_http_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            units: config.units.clone(),
        })
    }

    /// Builds the request URL for a coordinate pair.
    ///
    /// Coordinates are written with six decimal places (~0.1 m), matching
    /// what the provider echoes back.
    pub fn forecast_url(&self, coordinates: Coordinates) -> String {
        build_forecast_url(&self.base_url, &self.api_key, coordinates, self.units.as_deref())
    }
}

/// Builds a forecast request URL. Exposed separately so it can be tested
/// without constructing an HTTP client.
pub fn build_forecast_url(
    base_url: &str,
    api_key: &str,
    coordinates: Coordinates,
    units: Option<&str>,
) -> String {
    let mut url = format!(
        "{}/forecast/{}/{:.6},{:.6}?exclude={}",
        base_url.trim_end_matches('/'),
        api_key,
        coordinates.lat,
        coordinates.lng,
        EXCLUDED_BLOCKS,
    );
    if let Some(units) = units {
        url.push_str("&units=");
        url.push_str(units);
    }
    url
}

impl ForecastSource for DarkSkyClient {
    fn fetch(&self, coordinates: Coordinates) -> Result<ForecastPayload, ProviderError> {
        let url = self.forecast_url(coordinates);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(ProviderError::Http(response.status().as_u16()));
        }

        let body = response.text()?;
        parse_forecast_response(&body)
    }
}

/// Deserializes a provider response body.
pub fn parse_forecast_response(body: &str) -> Result<ForecastPayload, ProviderError> {
    Ok(serde_json::from_str(body)?)
}

// ============================================================================
// Tests
// ============================================================================
