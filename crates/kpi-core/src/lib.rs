// File: crates/kpi-core/src/lib.rs
// Summary: Core library entry point; exports the table-to-series conversion API.

pub mod error;
pub mod validity;
pub mod types;
pub mod scale;
pub mod axis;
pub mod settings;
pub mod dataset;
pub mod selection;
pub mod series;
pub mod dates;
pub mod smoothing;
pub mod variance;
pub mod format;
pub mod converter;
pub mod reorder;

pub use error::{KpiError, Result};
pub use validity::{is_valid, is_value_valid, is_variance_valid};
pub use types::{Viewport, ViewportSize};
pub use scale::{Scale, ScaleKind};
pub use axis::{Axis, TimeAxis, ValueAxis};
pub use settings::{SeriesSettings, SeriesSettingsOverride, Settings};
pub use dataset::{CellValue, Column, ColumnRole, Dataset};
pub use selection::{ColumnSelectionIds, SelectionId, SelectionIdFactory};
pub use series::{AxisTarget, AxisWriteBack, DataRepresentation, Point, Series};
pub use dates::{days_between, nearest_at_or_before};
pub use smoothing::loess;
pub use variance::{converter_for, AbsoluteDifference, PercentChange, VarianceConverter};
pub use format::{format_date, format_value, format_variance, NumberFormat};
pub use converter::{apply_scale, convert, DataConverter};
pub use reorder::{overwrite_front, swap_to_front};
