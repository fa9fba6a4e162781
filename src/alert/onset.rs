//! Rain onset detection.
//!
//! Scans the minute-level forecast for the moment precipitation probability
//! crosses the alert threshold. Only transitions are reported: if the
//! ambient probability is already at or above the threshold there is no
//! onset to announce.
//!
//! The anchor is the first sample's timestamp. It stands in for "now" when
//! computing lead time, and a sample at the anchor time is never an onset.

use serde::Deserialize;

use crate::model::{CurrentConditions, ForecastError, ForecastSample, Onset, OnsetResult, PrecipType};

/// Probability above which precipitation is considered alert-worthy.
pub const DEFAULT_THRESHOLD: f64 = 0.2;

/// How to choose among the samples that cross the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Earliest qualifying minute wins, even if a later one is more likely.
    #[default]
    FirstCrossing,
    /// Most likely qualifying minute wins; ties go to the earliest.
    HighestProbability,
}

/// Parameters of a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorPolicy {
    pub threshold: f64,
    pub selection: Selection,
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        DetectorPolicy {
            threshold: DEFAULT_THRESHOLD,
            selection: Selection::FirstCrossing,
        }
    }
}

impl DetectorPolicy {
    pub fn with_threshold(threshold: f64) -> Self {
        DetectorPolicy {
            threshold,
            ..DetectorPolicy::default()
        }
    }
}

/// Looks for a rain onset in `samples`.
///
/// Returns `NoOnset` with the provider's summary when the current
/// probability is already `>= threshold` (regardless of sample contents),
/// when `samples` is empty, or when no sample after the anchor is strictly
/// above the threshold.
///
/// Fails with `InvalidSampleOrder` if any timestamp is earlier than the one
/// before it. Equal timestamps are allowed.
pub fn detect(
    current: &CurrentConditions,
    samples: &[ForecastSample],
    policy: &DetectorPolicy,
) -> Result<OnsetResult, ForecastError> {
    let no_onset = || OnsetResult::NoOnset {
        summary: current.fallback_summary.clone(),
    };

    if current.precipitation_probability >= policy.threshold {
        return Ok(no_onset());
    }

    check_order(samples)?;

    let Some(anchor) = samples.first() else {
        return Ok(no_onset());
    };

    let mut candidates = samples.iter().filter(|s| {
        s.precipitation_probability > policy.threshold && s.timestamp != anchor.timestamp
    });

    let chosen = match policy.selection {
        Selection::FirstCrossing => candidates.next(),
        Selection::HighestProbability => candidates.fold(None, |best: Option<&ForecastSample>, s| {
            match best {
                Some(b) if b.precipitation_probability >= s.precipitation_probability => Some(b),
                _ => Some(s),
            }
        }),
    };

    let Some(sample) = chosen else {
        return Ok(no_onset());
    };

    let lead_minutes = lead_minutes(anchor, sample);
    Ok(OnsetResult::OnsetFound(Onset {
        lead_minutes,
        precip_type: sample.precipitation_type,
        intensity: sample.precipitation_intensity,
        probability: sample.precipitation_probability,
        message: format_onset_message(&sample.precipitation_type, lead_minutes),
    }))
}

/// Minutes from the anchor to `sample`, as a real number.
fn lead_minutes(anchor: &ForecastSample, sample: &ForecastSample) -> f64 {
    let millis = sample.timestamp.signed_duration_since(anchor.timestamp).num_milliseconds();
    millis as f64 / 60_000.0
}

fn check_order(samples: &[ForecastSample]) -> Result<(), ForecastError> {
    for (index, pair) in samples.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(ForecastError::InvalidSampleOrder {
                index: index + 1,
                previous: pair[0].timestamp,
                found: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// `"<Label> starting in <lead> mins"`, e.g. `"Rain starting in 3 mins"`.
///
/// Whole minutes print without a fractional part.
pub fn format_onset_message(precip_type: &PrecipType, lead_minutes: f64) -> String {
    format!("{} starting in {} mins", precip_type.label(), lead_minutes)
}

/// Upper-cases the first letter of every whitespace-separated word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
