//! Forecast normalization.
//!
//! Turns the provider's raw payload into the minimal internal model the
//! detector works on: current conditions plus an ordered list of minute
//! samples. Pure transformation, no I/O.

use crate::ingest::forecast::{ForecastPayload, RawMinute};
use crate::model::{CurrentConditions, ForecastError, ForecastSample, PrecipType};

/// Normalizes a raw provider payload.
///
/// Requires `currently.precipProbability` and a `minutely.data` array. The
/// array may be empty, in which case the sample list is empty too. A
/// sample without a usable `time`, or with a probability or intensity out
/// of range, is dropped. Samples are returned sorted by
/// timestamp.
pub fn normalize(
    payload: &ForecastPayload,
) -> Result<(CurrentConditions, Vec<ForecastSample>), ForecastError> {
    let currently = payload
        .currently
        .as_ref()
        .ok_or_else(|| malformed("missing `currently` block"))?;
    let current_probability = currently
        .precip_probability
        .ok_or_else(|| malformed("missing `currently.precipProbability`"))?;
    check_probability(current_probability, "currently.precipProbability")?;

    let minutely = payload
        .minutely
        .as_ref()
        .ok_or_else(|| malformed("missing `minutely` block"))?;
    let data = minutely
        .data
        .as_ref()
        .ok_or_else(|| malformed("missing `minutely.data` array"))?;

    let mut samples: Vec<ForecastSample> = data
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| normalize_sample(i, raw).ok())
        .collect();
    // Stable, so samples sharing a timestamp keep provider order.
    samples.sort_by_key(|s| s.timestamp);

    let fallback_summary = non_empty(minutely.summary.as_deref())
        .or_else(|| non_empty(currently.summary.as_deref()))
        .unwrap_or_default()
        .to_string();

    let current = CurrentConditions {
        precipitation_probability: current_probability,
        fallback_summary,
    };

    Ok((current, samples))
}

/// Parses a provider JSON body and normalizes it. A body that is not valid
/// JSON is reported as `MalformedPayload`.
pub fn normalize_json(
    body: &str,
) -> Result<(CurrentConditions, Vec<ForecastSample>), ForecastError> {
    let payload: ForecastPayload =
        serde_json::from_str(body).map_err(|e| malformed(&format!("invalid JSON: {}", e)))?;
    normalize(&payload)
}

fn normalize_sample(index: usize, raw: &RawMinute) -> Result<ForecastSample, ForecastError> {
    let time = raw
        .time
        .ok_or_else(|| malformed(&format!("minutely.data[{}] missing `time`", index)))?;

    // The provider omits zero-valued precipitation fields.
    let probability = raw.precip_probability.unwrap_or(0.0);
    check_probability(probability, &format!("minutely.data[{}].precipProbability", index))?;

    let intensity = raw.precip_intensity.unwrap_or(0.0);
    if !intensity.is_finite() || intensity < 0.0 {
        return Err(malformed(&format!(
            "minutely.data[{}].precipIntensity out of range: {}",
            index, intensity
        )));
    }

    ForecastSample::from_epoch(
        time,
        probability,
        intensity,
        PrecipType::parse(raw.precip_type.as_deref()),
    )
    .ok_or_else(|| malformed(&format!("minutely.data[{}].time out of range: {}", index, time)))
}

fn check_probability(value: f64, field: &str) -> Result<(), ForecastError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(malformed(&format!("{} out of range: {}", field, value)))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn malformed(detail: &str) -> ForecastError {
    ForecastError::MalformedPayload(detail.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn body(minutely_data: &str) -> String {
        format!(
            r#"{{
                "currently": {{ "summary": "Mostly Cloudy", "precipProbability": 0.1 }},
                "minutely": {{ "summary": "Rain starting later.", "data": {} }}
            }}"#,
            minutely_data
        )
    }

    #[test]
    fn test_extracts_current_conditions_and_samples() {
        let (current, samples) = normalize_json(&body(
            r#"[
                { "time": 1000, "precipIntensity": 0, "precipProbability": 0 },
                { "time": 1060, "precipIntensity": 1.5, "precipProbability": 0.35, "precipType": "rain" }
            ]"#,
        ))
        .expect("valid payload should normalize");

        assert_eq!(current.precipitation_probability, 0.1);
        assert_eq!(current.fallback_summary, "Rain starting later.");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp.timestamp(), 1000);
        assert_eq!(samples[0].precipitation_type, PrecipType::None);
        assert_eq!(samples[1].precipitation_probability, 0.35);
        assert_eq!(samples[1].precipitation_intensity, 1.5);
        assert_eq!(samples[1].precipitation_type, PrecipType::Rain);
    }

    #[test]
    fn test_empty_minutely_series_is_not_an_error() {
        let (current, samples) =
            normalize_json(&body("[]")).expect("empty series should still normalize");
        assert!(samples.is_empty());
        assert_eq!(current.fallback_summary, "Rain starting later.");
    }

    #[test]
    fn test_missing_currently_probability_is_malformed() {
        let result = normalize_json(
            r#"{ "currently": { "summary": "x" }, "minutely": { "summary": "y", "data": [] } }"#,
        );
        assert!(
            matches!(result, Err(ForecastError::MalformedPayload(ref m)) if m.contains("precipProbability")),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_missing_minutely_block_is_malformed() {
        let result = normalize_json(r#"{ "currently": { "precipProbability": 0.0 } }"#);
        assert!(matches!(result, Err(ForecastError::MalformedPayload(_))));
    }

    #[test]
    fn test_missing_minutely_data_array_is_malformed() {
        let result = normalize_json(
            r#"{ "currently": { "precipProbability": 0.0 }, "minutely": { "summary": "y" } }"#,
        );
        assert!(matches!(result, Err(ForecastError::MalformedPayload(ref m)) if m.contains("minutely.data")));
    }

    #[test]
    fn test_sample_without_time_is_skipped() {
        let (current, samples) = normalize_json(&body(
            r#"[ { "time": 1000 }, { "precipProbability": 0.5 }, { "time": 1120, "precipProbability": 0.2 } ]"#,
        ))
        .expect("one bad sample should not fail the payload");
        let times: Vec<i64> = samples.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(times, vec![1000, 1120]);
        assert_eq!(current.fallback_summary, "Rain starting later.");
    }

    #[test]
    fn test_out_of_range_probability_is_skipped() {
        let (_, samples) = normalize_json(&body(
            r#"[ { "time": 1000 }, { "time": 1060, "precipProbability": 1.5 } ]"#,
        ))
        .expect("should normalize");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp.timestamp(), 1000);
    }

    #[test]
    fn test_negative_intensity_is_skipped() {
        let (_, samples) = normalize_json(&body(
            r#"[ { "time": 1000, "precipProbability": 0.5, "precipIntensity": -0.1 } ]"#,
        ))
        .expect("should normalize");
        assert!(samples.is_empty());
    }

    #[test]
    fn test_out_of_range_current_probability_is_malformed() {
        let result = normalize_json(
            r#"{ "currently": { "precipProbability": 2.0 }, "minutely": { "data": [] } }"#,
        );
        assert!(matches!(result, Err(ForecastError::MalformedPayload(_))));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            normalize_json("{ not json"),
            Err(ForecastError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_sample_fields_default_to_zero() {
        let (_, samples) = normalize_json(&body(r#"[ { "time": 1000 } ]"#)).expect("should normalize");
        assert_eq!(samples[0].precipitation_probability, 0.0);
        assert_eq!(samples[0].precipitation_intensity, 0.0);
    }

    #[test]
    fn test_out_of_order_samples_are_sorted() {
        let (_, samples) = normalize_json(&body(
            r#"[ { "time": 1120 }, { "time": 1000 }, { "time": 1060 } ]"#,
        ))
        .expect("should normalize");
        let times: Vec<i64> = samples.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(times, vec![1000, 1060, 1120]);
    }

    #[test]
    fn test_fallback_summary_uses_currently_when_minutely_summary_blank() {
        let (current, _) = normalize_json(
            r#"{ "currently": { "summary": "Drizzle", "precipProbability": 0.0 },
                 "minutely": { "summary": "  ", "data": [] } }"#,
        )
        .expect("should normalize");
        assert_eq!(current.fallback_summary, "Drizzle");
    }

    #[test]
    fn test_fallback_summary_empty_when_no_summary_given() {
        let (current, _) = normalize_json(
            r#"{ "currently": { "precipProbability": 0.0 }, "minutely": { "data": [] } }"#,
        )
        .expect("should normalize");
        assert_eq!(current.fallback_summary, "");
    }
}
