// File: crates/kpi-core/src/converter.rs
// Summary: Pivots a role-tagged table into per-series points, axes, variance, staleness and text.
// Notes:
// - Conversion is infallible: invalid input yields `DataRepresentation::empty`.
// - "Now" is a parameter; nothing here reads the wall clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};

use crate::axis::ValueAxis;
use crate::dataset::{CellValue, Column, ColumnRole, Dataset, RoleIndex};
use crate::dates::{days_between, nearest_at_or_before};
use crate::format::{format_date, format_value, format_variance, NumberFormat};
use crate::selection::{ColumnSelectionIds, SelectionIdFactory};
use crate::series::{AxisTarget, AxisWriteBack, DataRepresentation, Point, Series};
use crate::settings::{SeriesSettings, Settings};
use crate::smoothing::loess;
use crate::types::{Viewport, ViewportSize};
use crate::validity::is_valid;
use crate::variance::converter_for;

/// Fraction added to a data-derived axis maximum so extrema do not touch the plot edge.
pub const AXIS_MAX_MARGIN: f64 = 0.01;

/// Table-to-series converter parameterized by the host identity factory.
#[derive(Clone, Debug, Default)]
pub struct DataConverter<F = ColumnSelectionIds> {
    ids: F,
}

impl DataConverter<ColumnSelectionIds> {
    pub fn new() -> Self { Self::default() }
}

/// Convert with the default column-keyed selection identities.
pub fn convert(dataset: &Dataset, settings: &Settings, viewport: Viewport, now: DateTime<Utc>) -> DataRepresentation {
    DataConverter::new().convert(dataset, settings, viewport, now)
}

impl<F: SelectionIdFactory> DataConverter<F> {
    pub fn with_ids(ids: F) -> Self {
        Self { ids }
    }

    pub fn convert(&self, dataset: &Dataset, settings: &Settings, viewport: Viewport, now: DateTime<Utc>) -> DataRepresentation {
        if !dataset.is_valid() {
            debug!("dataset has no category rows or no value columns; using empty representation");
            return DataRepresentation::empty(viewport, now);
        }

        let roles = dataset.role_index();
        let value_columns = roles.get(ColumnRole::Value);
        let Some(date_column) = roles.first(ColumnRole::Date).or(dataset.categories.first()) else {
            return DataRepresentation::empty(viewport, now);
        };
        if value_columns.is_empty() {
            debug!("no column carries the value role; using empty representation");
            return DataRepresentation::empty(viewport, now);
        }

        let dates: Vec<Option<DateTime<Utc>>> = date_column.values.iter().map(CellValue::as_date).collect();
        let skipped = dates.iter().filter(|d| d.is_none()).count();
        if skipped > 0 {
            warn!("skipping {skipped} row(s) with unparseable dates in column '{}'", date_column.display_name);
        }

        let mut latest_date = now;
        let mut pending: Vec<Option<Series>> = vec![None; value_columns.len()];

        for (row, date) in dates.iter().enumerate() {
            let Some(x) = *date else { continue };
            for (ci, column) in value_columns.iter().enumerate() {
                let series = pending[ci].get_or_insert_with(|| self.materialize(column, ci, &settings.series));
                append_point(series, x, column.values.get(row));
                if let Some(max) = series.x.max {
                    latest_date = max;
                }
            }
        }

        let side = SideValues::collect(&roles);
        let percent_calc_date = side.change_start_date.or(settings.date.percent_calc_date);

        let mut write_back = Vec::new();
        let mut stale_date_difference: Option<i64> = None;
        let mut series_out = Vec::with_capacity(pending.len());

        for (ci, series) in pending.into_iter().enumerate() {
            let Some(mut series) = series else { continue };
            series.tooltip = side.tooltip_for(ci);
            finish_series(&mut series, settings, percent_calc_date, now, &mut write_back);

            if let Some(days) = series.stale_date_difference {
                stale_date_difference = Some(stale_date_difference.map_or(days, |d| d.max(days)));
            }
            trace!(
                "series '{}': {} points, variance {}, stale {:?} days",
                series.name,
                series.points.len(),
                series.variance,
                series.stale_date_difference,
            );
            series_out.push(Arc::new(series));
        }

        debug!("converted {} series over {} rows", series_out.len(), dataset.row_count());

        DataRepresentation {
            sorted_series: series_out.clone(),
            series: series_out,
            warning_state: side.warning_state,
            latest_date,
            percent_calc_date,
            subtitle: side.subtitle,
            stale_date_difference,
            viewport,
            viewport_size: ViewportSize::from(viewport),
            write_back,
        }
    }

    fn materialize(&self, column: &Column, index: usize, defaults: &SeriesSettings) -> Series {
        let settings = SeriesSettings::resolve(defaults, column.settings_override.as_ref());
        let mut series = Series::new(column.display_name.clone(), index, self.ids.create(column, index), settings);
        series.format = column.format.clone();
        series
    }
}

/// Parse a cell under the series' empty-value policy.
fn parse_cell(cell: Option<&CellValue>, treat_empty_as_zero: bool) -> f64 {
    match cell.and_then(CellValue::as_number) {
        Some(v) if is_valid(v) => v,
        _ if treat_empty_as_zero => 0.0,
        _ => f64::NAN,
    }
}

fn append_point(series: &mut Series, x: DateTime<Utc>, cell: Option<&CellValue>) {
    let y = parse_cell(cell, series.settings.values.treat_empty_as_zero);
    let point = Point::new(series.points.len(), x, y);

    if let Some(prev) = series.points.last() {
        if series.is_flat_line && !(prev.y == y || (prev.y.is_nan() && y.is_nan())) {
            series.is_flat_line = false;
        }
    }

    if !series.settings.values.show_latest_available || point.has_value() {
        series.current = Some(point);
    }

    series.x.include(x);
    if point.has_value() {
        series.y.include(y);
        series.y_sparkline.include(y);
    }
    series.points.push(point);
}

fn first_cell(column: &Column) -> CellValue {
    column.values.first().cloned().unwrap_or_default()
}

/// Column-level side values, read from row 0.
#[derive(Debug, Default)]
struct SideValues {
    tooltips: Vec<Option<String>>,
    subtitle: Option<String>,
    warning_state: Option<f64>,
    change_start_date: Option<DateTime<Utc>>,
}

impl SideValues {
    fn collect(roles: &RoleIndex<'_>) -> Self {
        Self {
            tooltips: roles
                .get(ColumnRole::Tooltip)
                .iter()
                .map(|c| first_cell(c).as_text())
                .collect(),
            subtitle: roles.first(ColumnRole::Subtitle).and_then(|c| first_cell(c).as_text()),
            warning_state: roles
                .first(ColumnRole::WarningState)
                .and_then(|c| first_cell(c).as_number())
                .filter(|v| is_valid(*v)),
            change_start_date: roles.first(ColumnRole::ChangeStartDate).and_then(|c| first_cell(c).as_date()),
        }
    }

    /// Tooltip column paired by position, else the first one.
    fn tooltip_for(&self, index: usize) -> Option<String> {
        self.tooltips.get(index).or(self.tooltips.first()).cloned().flatten()
    }
}

/// Resolve an axis against configured bounds. A valid configured bound wins; otherwise the
/// data bound is written back (the max inflated by `AXIS_MAX_MARGIN`). Inverted bounds are swapped.
pub fn apply_scale(axis: &mut ValueAxis, cfg_min: &mut Option<f64>, cfg_max: &mut Option<f64>) {
    match *cfg_min {
        Some(v) if is_valid(v) => axis.min = Some(v),
        _ => *cfg_min = axis.min,
    }
    match *cfg_max {
        Some(v) if is_valid(v) => axis.max = Some(v),
        _ => {
            axis.max = axis.max.map(|m| m + (m * AXIS_MAX_MARGIN).abs());
            *cfg_max = axis.max;
        }
    }
    axis.swap_if_inverted();
    axis.apply_domain();
}

fn finish_series(
    series: &mut Series,
    settings: &Settings,
    percent_calc_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    write_back: &mut Vec<AxisWriteBack>,
) {
    series.x.capture_initial();
    series.y.capture_initial();
    series.y_sparkline.capture_initial();
    series.x.apply_domain();

    let cfg = &mut series.settings;
    apply_scale(&mut series.y, &mut cfg.y_axis.min, &mut cfg.y_axis.max);
    if cfg.sparkline_y_axis.inherit_values {
        cfg.sparkline_y_axis.min = cfg.y_axis.min;
        cfg.sparkline_y_axis.max = cfg.y_axis.max;
    }
    apply_scale(&mut series.y_sparkline, &mut cfg.sparkline_y_axis.min, &mut cfg.sparkline_y_axis.max);

    write_back.push(AxisWriteBack {
        series_name: series.name.clone(),
        axis: AxisTarget::Main,
        min: cfg.y_axis.min,
        max: cfg.y_axis.max,
    });
    write_back.push(AxisWriteBack {
        series_name: series.name.clone(),
        axis: AxisTarget::Sparkline,
        min: cfg.sparkline_y_axis.min,
        max: cfg.sparkline_y_axis.max,
    });

    let baseline = nearest_at_or_before(&series.points, percent_calc_date, series.points.first()).copied();
    let last = series.points.last().copied();

    series.variance = converter_for(series.settings.variance.calculate_difference).convert(baseline.as_ref(), last.as_ref());
    series.formatted_variance = format_variance(series.variance, &series.settings.variance);
    if let (Some(b), Some(l)) = (baseline, last) {
        series.formatted_date = format_date(b.x, &settings.date.format);
        series.date_difference = days_between(b.x, l.x);
    }

    let value_format = NumberFormat::for_values(&series.settings.values, series.format.as_deref());
    series.formatted_value = match series.current {
        Some(c) => format_value(c.y, &value_format, &settings.no_value_label),
        None => settings.no_value_label.clone(),
    };
    series.formatted_tooltip = build_tooltip(series);

    series.smoothed_points = if series.settings.sparkline.interpolate {
        loess(&series.points, &series.settings.sparkline.loess)
    } else {
        series.points.clone()
    };

    series.stale_date_difference = series.current.map(|c| days_between(c.x, now));
}

/// `label: <variance> change since <date> (<n> days)`, each part behind its own flag.
fn build_tooltip(series: &Series) -> Option<String> {
    let t = &series.settings.tooltip;
    if !t.show {
        return None;
    }
    let mut parts = Vec::new();
    if t.show_variance {
        parts.push(series.formatted_variance.clone());
    }
    if t.show_date && !series.formatted_date.is_empty() {
        parts.push(format!("change since {}", series.formatted_date));
    }
    if t.show_date_difference && !series.points.is_empty() {
        let unit = if series.date_difference == 1 { "day" } else { "days" };
        parts.push(format!("({} {unit})", series.date_difference));
    }
    if parts.is_empty() {
        return None;
    }
    let label = if t.label.is_empty() { series.name.as_str() } else { t.label.as_str() };
    Some(format!("{label}: {}", parts.join(" ")))
}
