// File: crates/kpi-core/src/series.rs
// Summary: Point/Series model and the render-ready data representation.
// Notes:
// - `series` and `sorted_series` share the same `Arc<Series>` values; reordering
//   only rebuilds the vector of handles.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::axis::{TimeAxis, ValueAxis};
use crate::selection::SelectionId;
use crate::settings::SeriesSettings;
use crate::types::{Viewport, ViewportSize};
use crate::validity::is_valid;

/// One sample. `y` is NaN when the date has no usable value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub index: usize,
    pub x: DateTime<Utc>,
    pub y: f64,
}

impl Point {
    pub const fn new(index: usize, x: DateTime<Utc>, y: f64) -> Self {
        Self { index, x, y }
    }

    pub fn has_value(&self) -> bool { is_valid(self.y) }

    /// Same date and value; NaN values compare equal to each other.
    pub fn same_as(&self, other: &Point) -> bool {
        self.x == other.x && (self.y == other.y || (self.y.is_nan() && other.y.is_nan()))
    }
}

#[derive(Clone, Debug)]
pub struct Series {
    pub name: String,
    pub index: usize,
    pub points: Vec<Point>,
    /// LOESS output when interpolation is on, else a copy of `points`.
    pub smoothed_points: Vec<Point>,
    /// Latest usable point (or literal latest point when "show latest available" is off).
    pub current: Option<Point>,
    pub x: TimeAxis,
    pub y: ValueAxis,
    pub y_sparkline: ValueAxis,
    pub is_flat_line: bool,
    pub variance: f64,
    pub formatted_variance: String,
    pub formatted_value: String,
    pub formatted_date: String,
    /// Days between the variance baseline and the last point.
    pub date_difference: i64,
    /// Days between `current` and now.
    pub stale_date_difference: Option<i64>,
    pub tooltip: Option<String>,
    pub formatted_tooltip: Option<String>,
    pub format: Option<String>,
    pub selection_id: SelectionId,
    pub settings: SeriesSettings,
}

impl Series {
    pub fn new(name: impl Into<String>, index: usize, selection_id: SelectionId, settings: SeriesSettings) -> Self {
        Self {
            name: name.into(),
            index,
            points: Vec::new(),
            smoothed_points: Vec::new(),
            current: None,
            x: TimeAxis::new(),
            y: ValueAxis::new(),
            y_sparkline: ValueAxis::new(),
            is_flat_line: true,
            variance: f64::NAN,
            formatted_variance: String::new(),
            formatted_value: String::new(),
            formatted_date: String::new(),
            date_difference: 0,
            stale_date_difference: None,
            tooltip: None,
            formatted_tooltip: None,
            format: None,
            selection_id,
            settings,
        }
    }

    pub fn last_point(&self) -> Option<&Point> { self.points.last() }

    pub fn is_stale(&self) -> bool {
        self.stale_date_difference
            .map_or(false, |d| self.settings.stale_data.is_stale(d))
    }
}

/// Which y-axis a write-back refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisTarget {
    Main,
    Sparkline,
}

/// Resolved axis bounds the caller may persist into its configuration for display.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisWriteBack {
    pub series_name: String,
    pub axis: AxisTarget,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct DataRepresentation {
    /// Canonical pivot order.
    pub series: Vec<Arc<Series>>,
    /// User-reorderable view over the same series.
    pub sorted_series: Vec<Arc<Series>>,
    pub warning_state: Option<f64>,
    pub latest_date: DateTime<Utc>,
    pub percent_calc_date: Option<DateTime<Utc>>,
    pub subtitle: Option<String>,
    pub stale_date_difference: Option<i64>,
    pub viewport: Viewport,
    pub viewport_size: ViewportSize,
    pub write_back: Vec<AxisWriteBack>,
}

impl DataRepresentation {
    /// Empty shape used for invalid or missing input.
    pub fn empty(viewport: Viewport, now: DateTime<Utc>) -> Self {
        Self {
            series: Vec::new(),
            sorted_series: Vec::new(),
            warning_state: None,
            latest_date: now,
            percent_calc_date: None,
            subtitle: None,
            stale_date_difference: None,
            viewport,
            viewport_size: ViewportSize::from(viewport),
            write_back: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool { self.series.is_empty() }

    pub fn find(&self, name: &str) -> Option<&Arc<Series>> {
        self.series.iter().find(|s| s.name == name)
    }
}
