#![forbid(unsafe_code)]

//! Core domain model and business logic for the BMI tracker.
//!
//! This crate provides:
//! - Domain types (measurements, metrics, history records)
//! - Input validation
//! - Metrics engine (BMI, BMR, ideal weight, daily calories)
//! - Chart projection for the BMI history
//! - Persistence (JSONL record store, reminder schedule, CSV export)

pub mod types;
pub mod error;
pub mod bands;
pub mod validation;
pub mod metrics;
pub mod chart;
pub mod config;
pub mod logging;
pub mod store;
pub mod recorder;
pub mod reminder;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use bands::{classify_bmi, BMI_BANDS, CHART_THRESHOLDS};
pub use validation::{Field, FieldError, ValidationErrors};
pub use metrics::{compute_from_form, compute_metrics};
pub use chart::{project_chart, ChartPoint, ChartProjection, ThresholdLine};
pub use config::Config;
pub use store::{JsonlStore, MemoryStore, RecordStore, Subscription};
pub use recorder::{Recorded, Recorder};
pub use reminder::{ReminderNotice, ReminderSchedule};
pub use export::export_csv;
