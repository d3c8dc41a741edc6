//! BMI band table.
//!
//! Classification thresholds live here and nowhere else: the metrics engine
//! classifies with [`classify_bmi`] and the chart derives point colors from
//! the same classification.

use crate::BmiClassification;

/// Sorted `(lower_bound, classification)` pairs. Bands are half-open with an
/// inclusive lower bound; the first band extends to negative infinity.
pub const BMI_BANDS: [(f64, BmiClassification); 6] = [
    (f64::NEG_INFINITY, BmiClassification::Underweight),
    (18.5, BmiClassification::Normal),
    (25.0, BmiClassification::Overweight),
    (30.0, BmiClassification::Obese1),
    (35.0, BmiClassification::Obese2),
    (40.0, BmiClassification::Obese3),
];

/// Reference lines drawn on the history chart
pub const CHART_THRESHOLDS: [f64; 3] = [BMI_BANDS[1].0, BMI_BANDS[2].0, BMI_BANDS[3].0];

/// Classify a BMI value into exactly one band
pub fn classify_bmi(bmi: f64) -> BmiClassification {
    // Number of bands whose lower bound is <= bmi; always >= 1 except for NaN
    let idx = BMI_BANDS.partition_point(|(lower, _)| *lower <= bmi);
    BMI_BANDS[idx.saturating_sub(1)].1
}

/// Lower and upper bound of a classification's band
pub fn band_range(classification: BmiClassification) -> (f64, f64) {
    let idx = BMI_BANDS
        .iter()
        .position(|(_, c)| *c == classification)
        .unwrap_or(0);
    let upper = BMI_BANDS
        .get(idx + 1)
        .map_or(f64::INFINITY, |(lower, _)| *lower);
    (BMI_BANDS[idx].0, upper)
}
