//! Core domain types for the BMI tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Measurement inputs (raw form and validated)
//! - Activity levels and biological sex
//! - Calculated health metrics and their classification
//! - Persisted history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Input Types
// ============================================================================

/// Biological sex, used only to pick the formula branch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn from_is_male(is_male: bool) -> Self {
        if is_male {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn is_male(self) -> bool {
        self == Sex::Male
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Activity level, each mapping to a fixed TDEE multiplier
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    Light,
    /// Moderate exercise 3-5 days/week
    Moderate,
    /// Hard exercise 6-7 days/week
    Active,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 4] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
    ];

    /// Multiplier applied to BMR to get daily calories
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }

    /// Map a raw multiplier back to its level. Only the four enumerated
    /// factors are accepted.
    pub fn from_factor(factor: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| (level.factor() - factor).abs() < 1e-9)
    }

    /// Parse either a level name or one of the enumerated factors
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            other => other
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .and_then(Self::from_factor),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary",
            ActivityLevel::Light => "Light",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::Active => "Active",
        }
    }
}

/// A measurement as typed by the user, before any parsing
#[derive(Clone, Debug)]
pub struct MeasurementForm {
    pub height: String,
    pub weight: String,
    pub age: String,
    pub sex: Sex,
    /// `None` when the activity could not be read at all
    pub activity_factor: Option<f64>,
}

/// A fully validated measurement, ready for calculation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MeasurementInput {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub sex: Sex,
    pub activity: ActivityLevel,
}

// ============================================================================
// Metric Types
// ============================================================================

/// BMI classification band
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BmiClassification {
    Underweight,
    Normal,
    Overweight,
    Obese1,
    Obese2,
    Obese3,
}

impl BmiClassification {
    pub fn label(self) -> &'static str {
        match self {
            BmiClassification::Underweight => "Underweight",
            BmiClassification::Normal => "Normal weight",
            BmiClassification::Overweight => "Overweight",
            BmiClassification::Obese1 => "Obesity (Class 1)",
            BmiClassification::Obese2 => "Severe obesity (Class 2)",
            BmiClassification::Obese3 => "Morbid obesity (Class 3)",
        }
    }

    /// Chart color bucket; the three obesity classes share one color
    pub fn chart_color(self) -> ChartColor {
        match self {
            BmiClassification::Underweight => ChartColor::Blue,
            BmiClassification::Normal => ChartColor::Green,
            BmiClassification::Overweight => ChartColor::Orange,
            BmiClassification::Obese1 | BmiClassification::Obese2 | BmiClassification::Obese3 => {
                ChartColor::Red
            }
        }
    }
}

impl fmt::Display for BmiClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visual color bucket for chart points
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChartColor {
    Blue,
    Green,
    Orange,
    Red,
}

impl ChartColor {
    pub fn hex(self) -> &'static str {
        match self {
            ChartColor::Blue => "#2196F3",
            ChartColor::Green => "#4CAF50",
            ChartColor::Orange => "#FF9800",
            ChartColor::Red => "#F44336",
        }
    }
}

/// Result of a metrics calculation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthMetrics {
    pub bmi: f64,
    pub classification: BmiClassification,
    /// Basal metabolic rate, kcal/day
    pub bmr: f64,
    pub ideal_weight_kg: f64,
    /// Total daily energy expenditure, kcal/day
    pub daily_calories: f64,
}

// ============================================================================
// History Types
// ============================================================================

/// Store-assigned record identifier
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record about to be stored; the store assigns the id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewRecord {
    pub created_at: DateTime<Utc>,
    pub input: MeasurementInput,
    pub metrics: HealthMetrics,
}

/// A persisted measurement with its calculated metrics
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub input: MeasurementInput,
    #[serde(flatten)]
    pub metrics: HealthMetrics,
}

impl HistoryRecord {
    pub fn from_new(id: RecordId, record: NewRecord) -> Self {
        Self {
            id,
            created_at: record.created_at,
            input: record.input,
            metrics: record.metrics,
        }
    }
}

/// One (timestamp, bmi) sample for the history chart
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartSample {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub bmi: f64,
}

impl From<&HistoryRecord> for ChartSample {
    fn from(record: &HistoryRecord) -> Self {
        ChartSample {
            timestamp_ms: record.created_at.timestamp_millis(),
            bmi: record.metrics.bmi,
        }
    }
}
