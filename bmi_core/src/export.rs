//! CSV export of the measurement history.

use crate::{HistoryRecord, Result};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: u64,
    created_at: String,
    height_cm: f64,
    weight_kg: f64,
    age_years: u32,
    sex: &'static str,
    activity: &'static str,
    activity_factor: f64,
    bmi: f64,
    classification: &'static str,
    bmr: f64,
    ideal_weight_kg: f64,
    daily_calories: f64,
}

impl From<&HistoryRecord> for CsvRow {
    fn from(record: &HistoryRecord) -> Self {
        CsvRow {
            id: record.id.0,
            created_at: record.created_at.to_rfc3339(),
            height_cm: record.input.height_cm,
            weight_kg: record.input.weight_kg,
            age_years: record.input.age_years,
            sex: record.input.sex.label(),
            activity: record.input.activity.label(),
            activity_factor: record.input.activity.factor(),
            bmi: round2(record.metrics.bmi),
            classification: record.metrics.classification.label(),
            bmr: round2(record.metrics.bmr),
            ideal_weight_kg: round2(record.metrics.ideal_weight_kg),
            daily_calories: round2(record.metrics.daily_calories),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Write records to a CSV file, replacing any previous export
///
/// The file is written with a header row, flushed and synced to disk.
/// Returns the number of rows written.
pub fn export_csv(records: &[HistoryRecord], path: &Path) -> Result<usize> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} records to {:?}", records.len(), path);
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compute_metrics, ActivityLevel, MeasurementInput, NewRecord, RecordId, Sex};
    use chrono::Utc;

    fn create_test_record(id: u64, weight_kg: f64) -> HistoryRecord {
        let input = MeasurementInput {
            height_cm: 165.0,
            weight_kg,
            age_years: 28,
            sex: Sex::Female,
            activity: ActivityLevel::Light,
        };
        HistoryRecord::from_new(
            RecordId(id),
            NewRecord {
                created_at: Utc::now(),
                input,
                metrics: compute_metrics(&input).unwrap(),
            },
        )
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("history.csv");

        let records = vec![create_test_record(2, 60.0), create_test_record(1, 62.5)];
        let count = export_csv(&records, &csv_path).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[9], "classification");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "2");
        assert_eq!(&rows[0][5], "Female");
        assert_eq!(&rows[0][7], "1.375");
        // 60 / 1.65² = 22.038...
        assert_eq!(&rows[0][8], "22.04");
    }

    #[test]
    fn test_export_replaces_previous_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        export_csv(&[create_test_record(1, 60.0), create_test_record(2, 61.0)], &csv_path)
            .unwrap();
        export_csv(&[create_test_record(3, 59.0)], &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 1);
    }

    #[test]
    fn test_export_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        assert_eq!(export_csv(&[], &csv_path).unwrap(), 0);
        assert!(csv_path.exists());
    }
}
