//! Measurement input validation.
//!
//! Every field is checked independently so a caller can flag each offending
//! control on its own. A measurement only becomes a [`MeasurementInput`] once
//! all fields pass.

use crate::{ActivityLevel, MeasurementForm, MeasurementInput};
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

pub const HEIGHT_RANGE_CM: RangeInclusive<f64> = 50.0..=300.0;
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 2.0..=500.0;
pub const AGE_RANGE_YEARS: RangeInclusive<u32> = 1..=120;

/// Input field a validation error refers to
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Height,
    Weight,
    Age,
    ActivityFactor,
    /// Chart canvas dimensions
    Canvas,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Height => "height",
            Field::Weight => "weight",
            Field::Age => "age",
            Field::ActivityFactor => "activity_factor",
            Field::Canvas => "canvas",
        }
    }
}

/// A single field-level validation failure
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.name(), self.message)
    }
}

/// All field errors found in one measurement
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error message for a given field, if that field failed
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn fields(&self) -> Vec<Field> {
        self.errors.iter().map(|e| e.field).collect()
    }

    fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Treat `,` and `.` as the same decimal separator
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

fn height_error() -> FieldError {
    FieldError::new(Field::Height, "must be between 50 and 300 cm")
}

fn weight_error() -> FieldError {
    FieldError::new(Field::Weight, "must be between 2 and 500 kg")
}

fn age_error() -> FieldError {
    FieldError::new(Field::Age, "must be between 1 and 120 years")
}

fn activity_error() -> FieldError {
    FieldError::new(
        Field::ActivityFactor,
        "must be one of 1.2, 1.375, 1.55 or 1.725",
    )
}

fn check_height(height_cm: f64) -> Option<FieldError> {
    (!HEIGHT_RANGE_CM.contains(&height_cm)).then(height_error)
}

fn check_weight(weight_kg: f64) -> Option<FieldError> {
    (!WEIGHT_RANGE_KG.contains(&weight_kg)).then(weight_error)
}

fn check_age(age_years: u32) -> Option<FieldError> {
    (!AGE_RANGE_YEARS.contains(&age_years)).then(age_error)
}

fn parse_real(raw: &str, field: Field, label: &str) -> Result<f64, FieldError> {
    if raw.trim().is_empty() {
        return Err(FieldError::new(field, format!("{} is required", label)));
    }
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::new(field, format!("{} must be a number", label)))
}

fn parse_age(raw: &str) -> Result<u32, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(Field::Age, "Age is required"));
    }
    match trimmed.parse::<i64>() {
        Ok(age) => u32::try_from(age).map_err(|_| age_error()),
        Err(_) => Err(FieldError::new(Field::Age, "Age must be a whole number")),
    }
}

impl MeasurementInput {
    /// Check every field against its domain, reporting all failures
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for error in [
            check_height(self.height_cm),
            check_weight(self.weight_kg),
            check_age(self.age_years),
        ]
        .into_iter()
        .flatten()
        {
            errors.push(error);
        }
        errors.into_result()
    }
}

impl MeasurementForm {
    /// Parse and validate the raw form.
    ///
    /// Weight accepts either `,` or `.` as decimal separator. Each field is
    /// reported independently; no input is produced unless all fields pass.
    pub fn parse(&self) -> Result<MeasurementInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let height = parse_real(&self.height, Field::Height, "Height")
            .and_then(|h| check_height(h).map_or(Ok(h), Err));
        let weight = parse_real(&normalize_decimal(&self.weight), Field::Weight, "Weight")
            .and_then(|w| check_weight(w).map_or(Ok(w), Err));
        let age = parse_age(&self.age).and_then(|a| check_age(a).map_or(Ok(a), Err));
        let activity = self
            .activity_factor
            .and_then(ActivityLevel::from_factor)
            .ok_or_else(activity_error);

        match (height, weight, age, activity) {
            (Ok(height_cm), Ok(weight_kg), Ok(age_years), Ok(activity)) => Ok(MeasurementInput {
                height_cm,
                weight_kg,
                age_years,
                sex: self.sex,
                activity,
            }),
            (height, weight, age, activity) => {
                for error in [height.err(), weight.err(), age.err(), activity.err()]
                    .into_iter()
                    .flatten()
                {
                    errors.push(error);
                }
                tracing::debug!("Measurement form rejected: {}", errors);
                Err(errors)
            }
        }
    }
}
