//! Request handling: geocode → fetch → normalize → detect → response.
//!
//! Each call is independent and holds no state between invocations, so a
//! single `RainAlert` can serve concurrent callers as long as its
//! collaborators can.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alert::{detect, DetectorPolicy};
use crate::ingest::{ForecastSource, Geocoder};
use crate::logging::{self, DataSource};
use crate::model::{OnsetResult, ProviderError};
use crate::normalize::normalize;

/// Message reported when no forecast could be obtained or interpreted.
pub const FORECAST_UNAVAILABLE: &str = "Forecast unavailable";

const REPLY_HEADER: &str = "X-Rainalert-Func-Reply";
const REPLY_HEADER_VALUE: &str = "rainalert-handler";

/// Response envelope returned to the hosting platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON document with a single `Message` field.
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    #[serde(rename = "Message")]
    message: &'a str,
}

impl Response {
    pub fn with_message(status_code: u16, message: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(REPLY_HEADER.to_string(), REPLY_HEADER_VALUE.to_string());

        // Serializing a struct of one &str cannot fail.
        let body = serde_json::to_string(&MessageBody { message })
            .unwrap_or_else(|_| format!("{{\"Message\":\"{}\"}}", FORECAST_UNAVAILABLE));

        Response {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }
}

/// The rain alert pipeline for one configured location.
pub struct RainAlert<G, F> {
    location: String,
    policy: DetectorPolicy,
    geocoder: G,
    forecast: F,
}

impl<G: Geocoder, F: ForecastSource> RainAlert<G, F> {
    pub fn new(location: impl Into<String>, policy: DetectorPolicy, geocoder: G, forecast: F) -> Self {
        RainAlert {
            location: location.into(),
            policy,
            geocoder,
            forecast,
        }
    }

    /// Runs the full pipeline once. Failures are logged before being returned.
    pub fn check(&self) -> Result<OnsetResult, ProviderError> {
        let location = self.location.as_str();

        let place = self.geocoder.geocode(location).inspect_err(|e| {
            logging::log_provider_failure(DataSource::Geocoder, location, "geocode", e)
        })?;
        logging::debug(
            DataSource::Geocoder,
            Some(location),
            &format!(
                "resolved to {}, {} ({})",
                place.coordinates.lat,
                place.coordinates.lng,
                place
                    .locality
                    .as_deref()
                    .or(place.formatted_address.as_deref())
                    .unwrap_or("unknown locality")
            ),
        );

        let payload = self.forecast.fetch(place.coordinates).inspect_err(|e| {
            logging::log_provider_failure(DataSource::Forecast, location, "fetch forecast", e)
        })?;

        let (current, samples) = normalize(&payload).map_err(|e| {
            let err = ProviderError::from(e);
            logging::log_provider_failure(DataSource::Forecast, location, "normalize forecast", &err);
            err
        })?;
        let received = payload
            .minutely
            .as_ref()
            .and_then(|m| m.data.as_ref())
            .map_or(0, Vec::len);
        if samples.len() < received {
            logging::warn(
                DataSource::Forecast,
                Some(location),
                &format!("dropped {} of {} minute samples", received - samples.len(), received),
            );
        }
        logging::debug(
            DataSource::Forecast,
            Some(location),
            &format!(
                "{} minute samples, current probability {}",
                samples.len(),
                current.precipitation_probability
            ),
        );

        let result = detect(&current, &samples, &self.policy).map_err(|e| {
            let err = ProviderError::from(e);
            logging::log_provider_failure(DataSource::Detector, location, "detect onset", &err);
            err
        })?;

        match &result {
            OnsetResult::OnsetFound(onset) => logging::info(
                DataSource::Detector,
                Some(location),
                &format!(
                    "{} (probability {}, intensity {})",
                    onset.message, onset.probability, onset.intensity
                ),
            ),
            OnsetResult::NoOnset { summary } => logging::debug(
                DataSource::Detector,
                Some(location),
                &format!("no onset: {}", summary),
            ),
        }

        Ok(result)
    }

    /// Runs the pipeline and packages the outcome as a response.
    ///
    /// Any failure yields status 502 with a generic message; an onset is
    /// never reported unless detection succeeded.
    pub fn handle(&self) -> Response {
        match self.check() {
            Ok(result) => Response::with_message(200, result.text()),
            Err(_) => Response::with_message(502, FORECAST_UNAVAILABLE),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev_mode::FixedGeocoder;
    use crate::ingest::forecast::{parse_forecast_response, ForecastPayload};
    use crate::model::{Coordinates, GeocodedLocation};

    struct StaticForecast(&'static str);

    impl ForecastSource for StaticForecast {
        fn fetch(&self, _coordinates: Coordinates) -> Result<ForecastPayload, ProviderError> {
            parse_forecast_response(self.0)
        }
    }

    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn geocode(&self, location: &str) -> Result<GeocodedLocation, ProviderError> {
            Err(ProviderError::LocationNotFound(location.to_string()))
        }
    }

    const ONSET_PAYLOAD: &str = r#"{
        "currently": { "precipProbability": 0.05, "summary": "Overcast" },
        "minutely": {
            "summary": "Light rain starting in 3 min.",
            "data": [
                { "time": 1000, "precipProbability": 0.0 },
                { "time": 1060, "precipProbability": 0.1 },
                { "time": 1180, "precipProbability": 0.45, "precipIntensity": 0.9, "precipType": "rain" }
            ]
        }
    }"#;

    fn alert<G: Geocoder, F: ForecastSource>(geocoder: G, forecast: F) -> RainAlert<G, F> {
        RainAlert::new("rg248jz", DetectorPolicy::default(), geocoder, forecast)
    }

    #[test]
    fn test_handle_reports_onset_message() {
        let response = alert(FixedGeocoder::new(51.28, -1.06), StaticForecast(ONSET_PAYLOAD)).handle();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"Message":"Rain starting in 3 mins"}"#);
        assert_eq!(response.headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert_eq!(
            response.headers.get(REPLY_HEADER).map(String::as_str),
            Some(REPLY_HEADER_VALUE)
        );
    }

    #[test]
    fn test_handle_survives_one_malformed_sample() {
        let payload = r#"{
            "currently": { "precipProbability": 0.05 },
            "minutely": { "summary": "Dry for the hour.",
                          "data": [ { "time": 1000, "precipProbability": 0.0 },
                                    { "precipProbability": 0.9 },
                                    { "time": 1120, "precipProbability": 0.1 } ] }
        }"#;
        let response = alert(FixedGeocoder::new(0.0, 0.0), StaticForecast(payload)).handle();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"Message":"Dry for the hour."}"#);
    }

    #[test]
    fn test_handle_reports_summary_when_already_raining() {
        let payload = r#"{
            "currently": { "precipProbability": 0.8 },
            "minutely": { "summary": "Rain for the hour.",
                          "data": [ { "time": 1000, "precipProbability": 0.9 },
                                    { "time": 1060, "precipProbability": 0.9 } ] }
        }"#;
        let response = alert(FixedGeocoder::new(0.0, 0.0), StaticForecast(payload)).handle();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"Message":"Rain for the hour."}"#);
    }

    #[test]
    fn test_malformed_payload_yields_unavailable_not_onset() {
        let payload = r#"{ "minutely": { "data": [ { "time": 1060, "precipProbability": 0.9 } ] } }"#;
        let pipeline = alert(FixedGeocoder::new(0.0, 0.0), StaticForecast(payload));
        assert!(matches!(pipeline.check(), Err(ProviderError::Forecast(_))));

        let response = pipeline.handle();
        assert_eq!(response.status_code, 502);
        assert_eq!(response.body, r#"{"Message":"Forecast unavailable"}"#);
    }

    #[test]
    fn test_geocode_failure_yields_unavailable() {
        let response = alert(FailingGeocoder, StaticForecast(ONSET_PAYLOAD)).handle();
        assert_eq!(response.status_code, 502);
        assert!(response.body.contains(FORECAST_UNAVAILABLE));
    }

    #[test]
    fn test_message_body_is_json_escaped() {
        let response = Response::with_message(200, r#"Say "hi""#);
        let parsed: serde_json::Value =
            serde_json::from_str(&response.body).expect("body should be valid JSON");
        assert_eq!(parsed["Message"], r#"Say "hi""#);
    }

    #[test]
    fn test_response_envelope_field_names() {
        let response = Response::with_message(200, "ok");
        let value = serde_json::to_value(&response).expect("response serializes");
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["isBase64Encoded"], false);
        assert!(value["headers"]["Content-Type"].is_string());
    }
}
