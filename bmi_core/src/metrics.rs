//! Metrics engine: BMI, basal metabolic rate, ideal weight and daily
//! calorie needs.
//!
//! Formulas:
//! - BMI = weight(kg) / height(m)²
//! - BMR (Mifflin-St Jeor) = 10 × weight + 6.25 × height − 5 × age, +5 for
//!   men, −161 for women
//! - Ideal weight (Devine 1974) = 50 kg (men) or 45.5 kg (women) plus 2.3 kg
//!   per inch over five feet
//! - Daily calories (TDEE) = BMR × activity factor

use crate::{classify_bmi, HealthMetrics, MeasurementForm, MeasurementInput, Result, Sex};

const CM_PER_INCH: f64 = 2.54;
const FIVE_FEET_INCHES: f64 = 60.0;
const DEVINE_KG_PER_INCH: f64 = 2.3;

/// Calculate BMI from weight and height
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Basal metabolic rate using the Mifflin-St Jeor equation
pub fn bmr_mifflin_st_jeor(weight_kg: f64, height_cm: f64, age_years: u32, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

/// Ideal body weight using the Devine formula.
///
/// Heights at or below five feet get the base weight; shorter stature never
/// reduces it.
pub fn ideal_weight_devine(height_cm: f64, sex: Sex) -> f64 {
    let base = match sex {
        Sex::Male => 50.0,
        Sex::Female => 45.5,
    };
    let inches_over_five_feet = height_cm / CM_PER_INCH - FIVE_FEET_INCHES;
    if inches_over_five_feet > 0.0 {
        base + DEVINE_KG_PER_INCH * inches_over_five_feet
    } else {
        base
    }
}

/// Compute all health metrics for a measurement.
///
/// The input is re-validated first; either all five outputs are produced or
/// an [`crate::Error::InvalidInput`] is returned.
pub fn compute_metrics(input: &MeasurementInput) -> Result<HealthMetrics> {
    input.validate()?;

    let bmi = bmi(input.weight_kg, input.height_cm);
    let bmr = bmr_mifflin_st_jeor(input.weight_kg, input.height_cm, input.age_years, input.sex);
    let metrics = HealthMetrics {
        bmi,
        classification: classify_bmi(bmi),
        bmr,
        ideal_weight_kg: ideal_weight_devine(input.height_cm, input.sex),
        daily_calories: bmr * input.activity.factor(),
    };

    tracing::debug!(
        "Computed metrics: bmi={:.2} ({:?}), bmr={:.1}",
        metrics.bmi,
        metrics.classification,
        metrics.bmr
    );
    Ok(metrics)
}

/// Parse a raw form and compute its metrics
pub fn compute_from_form(form: &MeasurementForm) -> Result<(MeasurementInput, HealthMetrics)> {
    let input = form.parse()?;
    let metrics = compute_metrics(&input)?;
    Ok((input, metrics))
}
