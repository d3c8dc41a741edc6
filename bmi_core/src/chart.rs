//! Chart projection for the BMI history.
//!
//! Maps a series of (timestamp, bmi) samples onto canvas pixel coordinates.
//! The pixel origin is the top-left corner, so higher BMI values get smaller
//! y coordinates. The y-domain always covers the 18.0..31.0 window so the
//! reference lines at 18.5, 25.0 and 30.0 are visible.

use crate::validation::{Field, FieldError, ValidationErrors};
use crate::{classify_bmi, ChartColor, ChartSample, Error, Result, CHART_THRESHOLDS};
use serde::Serialize;

/// Minimum number of samples needed to draw a line
pub const MIN_SAMPLES: usize = 2;

const FORCED_Y_MIN: f64 = 18.0;
const FORCED_Y_MAX: f64 = 31.0;
const Y_PADDING: f64 = 1.0;

/// A projected sample
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub color: ChartColor,
    pub bmi: f64,
    pub timestamp_ms: i64,
}

/// A horizontal reference line
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct ThresholdLine {
    pub value: f64,
    pub pixel_y: f64,
}

/// Result of projecting a series onto a canvas
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChartProjection {
    /// Points in ascending timestamp order
    pub points: Vec<ChartPoint>,
    pub threshold_lines: Vec<ThresholdLine>,
    pub y_min: f64,
    pub y_max: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl ChartProjection {
    /// Pixel y for a BMI value under this projection's y-domain
    pub fn y_for(&self, bmi: f64) -> f64 {
        map_y(bmi, self.y_min, self.y_max - self.y_min, self.canvas_height)
    }

    /// Inverse of the y mapping: the BMI value drawn at pixel row `y`
    pub fn bmi_at(&self, y: f64) -> f64 {
        let range = self.y_max - self.y_min;
        self.y_min + (self.canvas_height - y) / self.canvas_height * range
    }

    /// Vertices of the connecting line, in drawing order
    pub fn polyline(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().map(|p| (p.x, p.y))
    }
}

fn map_y(bmi: f64, y_min: f64, bmi_range: f64, height: f64) -> f64 {
    height - ((bmi - y_min) / bmi_range * height)
}

fn check_canvas(width: f64, height: f64) -> Result<()> {
    let bad = |v: f64| !(v.is_finite() && v > 0.0);
    if bad(width) || bad(height) {
        return Err(Error::InvalidInput(ValidationErrors {
            errors: vec![FieldError::new(
                Field::Canvas,
                format!("must be positive, got {}x{}", width, height),
            )],
        }));
    }
    Ok(())
}

/// Project samples onto a `width` x `height` canvas.
///
/// Samples may arrive in any order (the store hands them out newest first);
/// they are stably sorted by timestamp, so equal timestamps keep their input
/// order.
pub fn project_chart(samples: &[ChartSample], width: f64, height: f64) -> Result<ChartProjection> {
    if samples.len() < MIN_SAMPLES {
        return Err(Error::InsufficientData {
            required: MIN_SAMPLES,
            actual: samples.len(),
        });
    }
    check_canvas(width, height)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.timestamp_ms);

    let first = sorted[0].timestamp_ms;
    let last = sorted[sorted.len() - 1].timestamp_ms;
    // Identical timestamps would otherwise divide by zero
    let time_span = (last - first).max(1) as f64;

    let (min_bmi, max_bmi) = sorted
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.bmi), hi.max(s.bmi))
        });
    let y_min = min_bmi.min(FORCED_Y_MIN) - Y_PADDING;
    let y_max = max_bmi.max(FORCED_Y_MAX) + Y_PADDING;
    let bmi_range = y_max - y_min;

    let points = sorted
        .iter()
        .map(|s| ChartPoint {
            x: (s.timestamp_ms - first) as f64 / time_span * width,
            y: map_y(s.bmi, y_min, bmi_range, height),
            color: classify_bmi(s.bmi).chart_color(),
            bmi: s.bmi,
            timestamp_ms: s.timestamp_ms,
        })
        .collect();

    let threshold_lines = CHART_THRESHOLDS
        .iter()
        .map(|&value| ThresholdLine {
            value,
            pixel_y: map_y(value, y_min, bmi_range, height),
        })
        .filter(|line| (0.0..=height).contains(&line.pixel_y))
        .collect();

    tracing::debug!(
        "Projected {} samples onto {}x{} (y-domain {:.1}..{:.1})",
        sorted.len(),
        width,
        height,
        y_min,
        y_max
    );

    Ok(ChartProjection {
        points,
        threshold_lines,
        y_min,
        y_max,
        canvas_width: width,
        canvas_height: height,
    })
}
