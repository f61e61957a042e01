// File: crates/kpi-core/tests/converter.rs
// Purpose: End-to-end conversion of role-tagged tables into series, axes, variance and staleness.

use chrono::{DateTime, Duration, TimeZone, Utc};
use kpi_core::settings::SeriesSettingsOverride;
use kpi_core::{
    convert, AxisTarget, CellValue, Column, ColumnRole, DataConverter, Dataset, SelectionId, Settings, Viewport,
    ViewportSize,
};

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

fn date_column(days: usize) -> Column {
    Column::new("Date", ColumnRole::Date, (0..days as i64).map(|d| CellValue::Date(day(d))).collect())
}

fn value_column(name: &str, values: &[Option<f64>]) -> Column {
    Column::new(name, ColumnRole::Value, values.iter().map(|v| CellValue::from(*v)).collect())
}

fn dataset(columns: Vec<Column>) -> Dataset {
    let rows = columns.first().map_or(0, |c| c.values.len());
    Dataset::new(vec![date_column(rows)], columns).expect("consistent columns")
}

fn viewport() -> Viewport {
    Viewport::new(400.0, 300.0)
}

#[test]
fn empty_dataset_gives_default_shape() {
    let now = day(30);
    let rep = convert(&Dataset::default(), &Settings::default(), viewport(), now);
    assert!(rep.series.is_empty());
    assert!(rep.sorted_series.is_empty());
    assert_eq!(rep.latest_date, now);
    assert_eq!(rep.warning_state, None);
    assert_eq!(rep.stale_date_difference, None);
    assert_eq!(rep.viewport_size, ViewportSize::from(viewport()));
}

#[test]
fn dates_without_value_columns_give_default_shape() {
    let ds = Dataset::new(vec![date_column(3)], Vec::new()).unwrap();
    let rep = convert(&ds, &Settings::default(), viewport(), day(5));
    assert!(rep.is_empty());
}

#[test]
fn all_nan_series_has_no_current_and_no_bounds() {
    let ds = dataset(vec![value_column("Empty", &[None; 14])]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(20));
    let s = &rep.series[0];
    assert_eq!(s.points.len(), 14);
    assert!(s.current.is_none());
    assert_eq!(s.y.min, None);
    assert_eq!(s.y.max, None);
    assert_eq!(s.y.initial_min(), None);
    assert!(!s.y.scale.is_set());
    assert!(s.variance.is_nan());
    assert_eq!(s.formatted_variance, "N/A");
    assert_eq!(s.stale_date_difference, None);
    assert_eq!(rep.stale_date_difference, None);
}

#[test]
fn show_latest_available_skips_trailing_gaps() {
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), None, None])]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(10));
    let current = rep.series[0].current.expect("usable value exists");
    assert_eq!(current.y, 10.0);
    assert_eq!(current.x, day(0));
}

#[test]
fn literal_latest_point_when_show_latest_disabled() {
    let mut settings = Settings::default();
    settings.series.values.show_latest_available = false;
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), None, None])]);
    let rep = convert(&ds, &settings, viewport(), day(10));
    let current = rep.series[0].current.unwrap();
    assert!(current.y.is_nan());
    assert_eq!(current.index, 2);
}

#[test]
fn treat_empty_as_zero_fills_gaps() {
    let mut settings = Settings::default();
    settings.series.values.treat_empty_as_zero = true;
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), None, Some(4.0), None])]);
    let rep = convert(&ds, &settings, viewport(), day(10));
    let ys: Vec<f64> = rep.series[0].points.iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![10.0, 0.0, 4.0, 0.0]);
    assert_eq!(rep.series[0].y.initial_min(), Some(0.0));
}

#[test]
fn nan_values_do_not_touch_bounds() {
    let ds = dataset(vec![value_column("Sales", &[Some(5.0), None, Some(20.0), None])]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(10));
    let s = &rep.series[0];
    assert_eq!(s.y.initial_min(), Some(5.0));
    assert_eq!(s.y.initial_max(), Some(20.0));
    assert_eq!(s.x.initial_min(), Some(day(0)));
    assert_eq!(s.x.initial_max(), Some(day(3)));
}

#[test]
fn percent_variance_and_tooltip() {
    let ds = dataset(vec![value_column("Sales", &[Some(100.0), Some(120.0), Some(150.0)])]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(2));
    let s = &rep.series[0];
    assert!((s.variance - 0.5).abs() < 1e-12);
    assert_eq!(s.formatted_variance, "50.00%");
    assert_eq!(s.formatted_date, "01/01/2024");
    assert_eq!(s.date_difference, 2);
    assert_eq!(s.formatted_tooltip.as_deref(), Some("Sales: 50.00% change since 01/01/2024 (2 days)"));
}

#[test]
fn tooltip_parts_follow_their_flags() {
    let mut settings = Settings::default();
    settings.series.tooltip.show_date = false;
    settings.series.tooltip.label = "Change".to_string();
    let ds = dataset(vec![value_column("Sales", &[Some(100.0), Some(150.0)])]);
    let rep = convert(&ds, &settings, viewport(), day(2));
    assert_eq!(rep.series[0].formatted_tooltip.as_deref(), Some("Change: 50.00% (1 day)"));

    settings.series.tooltip.show = false;
    let rep = convert(&ds, &settings, viewport(), day(2));
    assert_eq!(rep.series[0].formatted_tooltip, None);
}

#[test]
fn configured_baseline_date_selects_nearest_earlier_point() {
    let mut settings = Settings::default();
    settings.date.percent_calc_date = Some(day(1) + Duration::hours(12));
    let ds = dataset(vec![value_column("Sales", &[Some(50.0), Some(100.0), Some(120.0), Some(150.0)])]);
    let rep = convert(&ds, &settings, viewport(), day(3));
    let s = &rep.series[0];
    assert!((s.variance - 0.5).abs() < 1e-12);
    assert_eq!(s.date_difference, 2);
    assert_eq!(rep.percent_calc_date, settings.date.percent_calc_date);
}

#[test]
fn baseline_before_first_point_falls_back_to_first_point() {
    let mut settings = Settings::default();
    settings.date.percent_calc_date = Some(day(-10));
    let ds = dataset(vec![value_column("Sales", &[Some(100.0), Some(150.0)])]);
    let rep = convert(&ds, &settings, viewport(), day(1));
    assert!((rep.series[0].variance - 0.5).abs() < 1e-12);
}

#[test]
fn change_start_date_column_overrides_configuration() {
    let mut settings = Settings::default();
    settings.date.percent_calc_date = Some(day(0));
    let start = Column::new("Start", ColumnRole::ChangeStartDate, vec![CellValue::Date(day(2)); 4]);
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), Some(20.0), Some(100.0), Some(110.0)]), start]);
    let rep = convert(&ds, &settings, viewport(), day(3));
    assert_eq!(rep.percent_calc_date, Some(day(2)));
    assert!((rep.series[0].variance - 0.1).abs() < 1e-12);
}

#[test]
fn column_override_switches_to_absolute_difference() {
    let mut o = SeriesSettingsOverride::default();
    o.variance.calculate_difference = Some(true);
    let a = value_column("A", &[Some(100.0), Some(150.0)]);
    let b = value_column("B", &[Some(100.0), Some(150.0)]).with_override(o);
    let rep = convert(&dataset(vec![a, b]), &Settings::default(), viewport(), day(1));
    assert!((rep.series[0].variance - 0.5).abs() < 1e-12);
    assert_eq!(rep.series[1].variance, 50.0);
    assert!(rep.series[1].settings.variance.calculate_difference);
    assert!(!rep.series[0].settings.variance.calculate_difference);
}

#[test]
fn staleness_uses_injected_now() {
    let a = value_column("A", &[Some(1.0), Some(2.0), Some(3.0)]);
    let b = value_column("B", &[Some(1.0), None, None]);
    let rep = convert(&dataset(vec![a, b]), &Settings::default(), viewport(), day(7));
    assert_eq!(rep.series[0].stale_date_difference, Some(5));
    assert_eq!(rep.series[1].stale_date_difference, Some(7));
    assert_eq!(rep.stale_date_difference, Some(7));
    assert_eq!(rep.latest_date, day(2));
}

#[test]
fn data_bounds_are_written_back_with_margin() {
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), Some(200.0)])]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(1));
    let s = &rep.series[0];
    assert_eq!(s.y.min, Some(10.0));
    assert_eq!(s.y.max, Some(202.0));
    assert_eq!(s.y.initial_max(), Some(200.0));
    assert_eq!(s.settings.y_axis.max, Some(202.0));

    let main = rep.write_back.iter().find(|w| w.axis == AxisTarget::Main).unwrap();
    assert_eq!(main.series_name, "Sales");
    assert_eq!((main.min, main.max), (Some(10.0), Some(202.0)));
}

#[test]
fn user_bounds_change_min_max_but_not_initial_bounds() {
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), Some(20.0), Some(30.0)])]);
    let first = convert(&ds, &Settings::default(), viewport(), day(2));

    let mut settings = Settings::default();
    settings.series.y_axis.min = Some(-100.0);
    settings.series.y_axis.max = Some(500.0);
    let second = convert(&ds, &settings, viewport(), day(2));

    let (a, b) = (&first.series[0], &second.series[0]);
    assert_eq!(a.y.initial_min(), b.y.initial_min());
    assert_eq!(a.y.initial_max(), b.y.initial_max());
    assert_eq!(b.y.min, Some(-100.0));
    assert_eq!(b.y.max, Some(500.0));
    assert_ne!(a.y.min, b.y.min);
}

#[test]
fn sparkline_axis_inherits_main_bounds() {
    let mut settings = Settings::default();
    settings.series.y_axis.min = Some(0.0);
    settings.series.y_axis.max = Some(1000.0);
    settings.series.sparkline_y_axis.inherit_values = true;
    let ds = dataset(vec![value_column("Sales", &[Some(10.0), Some(20.0)])]);
    let rep = convert(&ds, &settings, viewport(), day(1));
    let s = &rep.series[0];
    assert_eq!(s.y_sparkline.min, Some(0.0));
    assert_eq!(s.y_sparkline.max, Some(1000.0));

    settings.series.sparkline_y_axis.inherit_values = false;
    let rep = convert(&ds, &settings, viewport(), day(1));
    assert_eq!(rep.series[0].y_sparkline.min, Some(10.0));
}

#[test]
fn smoothing_follows_interpolate_toggle() {
    let values: Vec<Option<f64>> = (0..40).map(|i| Some(((i * 7) % 11) as f64)).collect();
    let ds = dataset(vec![value_column("Noisy", &values)]);

    let rep = convert(&ds, &Settings::default(), viewport(), day(40));
    let s = &rep.series[0];
    assert_eq!(s.smoothed_points.len(), s.points.len());

    let mut settings = Settings::default();
    settings.series.sparkline.interpolate = false;
    let rep = convert(&ds, &settings, viewport(), day(40));
    let s = &rep.series[0];
    assert!(s.smoothed_points.iter().zip(&s.points).all(|(a, b)| a.same_as(b)));
}

#[test]
fn conversion_is_idempotent() {
    let ds = dataset(vec![
        value_column("A", &[Some(3.0), None, Some(8.0), Some(2.0)]),
        value_column("B", &[None, Some(1.0), Some(1.0), Some(1.0)]),
    ]);
    let settings = Settings::default();
    let r1 = convert(&ds, &settings, viewport(), day(9));
    let r2 = convert(&ds, &settings, viewport(), day(9));
    for (a, b) in r1.series.iter().zip(&r2.series) {
        assert_eq!(a.points.len(), b.points.len());
        assert!(a.points.iter().zip(&b.points).all(|(p, q)| p.same_as(q)));
        assert!(a.variance == b.variance || (a.variance.is_nan() && b.variance.is_nan()));
    }
}

#[test]
fn flat_line_detection() {
    let ds = dataset(vec![
        value_column("Flat", &[Some(4.0), Some(4.0), Some(4.0)]),
        value_column("Moving", &[Some(4.0), Some(4.0), Some(5.0)]),
    ]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(3));
    assert!(rep.series[0].is_flat_line);
    assert!(!rep.series[1].is_flat_line);
}

#[test]
fn side_columns_feed_subtitle_warning_and_tooltip() {
    let rows = 2;
    let sub = Column::new("Sub", ColumnRole::Subtitle, vec![CellValue::from("Quarterly KPIs"); rows]);
    let warn = Column::new("Warn", ColumnRole::WarningState, vec![CellValue::Number(2.0); rows]);
    let tip = Column::new("Tip", ColumnRole::Tooltip, vec![CellValue::from("Net of returns"); rows]);
    let ds = dataset(vec![value_column("Sales", &[Some(1.0), Some(2.0)]), sub, warn, tip]);
    let rep = convert(&ds, &Settings::default(), viewport(), day(1));
    assert_eq!(rep.subtitle.as_deref(), Some("Quarterly KPIs"));
    assert_eq!(rep.warning_state, Some(2.0));
    assert_eq!(rep.series[0].tooltip.as_deref(), Some("Net of returns"));
    assert_eq!(rep.series.len(), 1);
}

#[test]
fn unparseable_dates_are_skipped() {
    let dates = Column::new(
        "Date",
        ColumnRole::Date,
        vec![CellValue::from("2024-01-01"), CellValue::from("not a date"), CellValue::from("2024-01-03")],
    );
    let ds = Dataset::new(vec![dates], vec![value_column("Sales", &[Some(1.0), Some(2.0), Some(3.0)])]).unwrap();
    let rep = convert(&ds, &Settings::default(), viewport(), day(5));
    let s = &rep.series[0];
    assert_eq!(s.points.len(), 2);
    assert_eq!(s.points[1].index, 1);
    assert_eq!(s.points[1].y, 3.0);
}

#[test]
fn custom_identity_factory_is_used() {
    let converter = DataConverter::with_ids(|c: &Column, i: usize| SelectionId::new(format!("{}#{i}", c.display_name)));
    let ds = dataset(vec![value_column("A", &[Some(1.0)]), value_column("B", &[Some(2.0)])]);
    let rep = converter.convert(&ds, &Settings::default(), viewport(), day(1));
    assert_eq!(rep.series[1].selection_id, SelectionId::new("B#1"));
    assert_ne!(rep.series[0].selection_id, rep.series[1].selection_id);
}

#[test]
fn formatted_value_uses_column_format() {
    let col = value_column("Revenue", &[Some(1234.5)]).with_format("$#,0.00");
    let mut settings = Settings::default();
    settings.series.values.display_units = kpi_core::settings::DisplayUnits::None;
    let rep = convert(&dataset(vec![col]), &settings, viewport(), day(1));
    assert_eq!(rep.series[0].formatted_value, "$1,234.50");
}
