//! Measurement recorder.
//!
//! Ties the metrics engine, the chart projector and a record store
//! together. The store is passed in by whoever builds the recorder; there
//! is no process-wide instance.

use crate::{
    compute_from_form, project_chart, ChartProjection, ChartSample, HealthMetrics, HistoryRecord,
    MeasurementForm, NewRecord, RecordStore, Result,
};
use chrono::{DateTime, Utc};

/// Outcome of a successful calculation that was stored
#[derive(Clone, Debug)]
pub struct Recorded {
    pub metrics: HealthMetrics,
    pub record: HistoryRecord,
}

pub struct Recorder<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> Recorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, calculate, and store one measurement.
    ///
    /// Nothing is written when validation fails.
    pub fn record(&mut self, form: &MeasurementForm, now: DateTime<Utc>) -> Result<Recorded> {
        let (input, metrics) = compute_from_form(form)?;
        let record = self.store.insert(NewRecord {
            created_at: now,
            input,
            metrics,
        })?;

        tracing::info!(
            "Recorded measurement {}: BMI {:.2} ({})",
            record.id,
            metrics.bmi,
            metrics.classification
        );
        Ok(Recorded { metrics, record })
    }

    /// Project the stored history onto a canvas
    pub fn chart(&self, width: f64, height: f64) -> Result<ChartProjection> {
        let samples: Vec<ChartSample> = self.store.records()?.iter().map(ChartSample::from).collect();
        project_chart(&samples, width, height)
    }
}
