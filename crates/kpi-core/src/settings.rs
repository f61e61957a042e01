// File: crates/kpi-core/src/settings.rs
// Summary: Formatting/axis/tooltip/smoothing settings with card defaults and per-column overrides.
// Notes:
// - Every container deserializes with `#[serde(default)]`, so partial JSON/TOML works.
// - Column overrides are merged once per series by `SeriesSettings::resolve`; the
//   result is a plain snapshot, not a live chain back to the defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Display-unit scaling applied before formatting a number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnits {
    #[default]
    Auto,
    None,
    Thousands,
    Millions,
    Billions,
    Trillions,
}

/// Generates a field-wise override struct for a settings container.
/// Each field is optional; `apply` writes the present ones onto a base value.
macro_rules! define_override {
    ($target:ident => $name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: Option<$ty>,)*
        }

        impl $name {
            pub fn apply(&self, base: &mut $target) {
                $(if let Some(v) = &self.$field { base.$field = v.clone(); })*
            }
        }
    };
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuesSettings {
    pub display_units: DisplayUnits,
    pub precision: Option<u32>,
    pub format: Option<String>,
    pub treat_empty_as_zero: bool,
    pub show_latest_available: bool,
}

impl Default for ValuesSettings {
    fn default() -> Self {
        Self {
            display_units: DisplayUnits::Auto,
            precision: None,
            format: None,
            treat_empty_as_zero: false,
            show_latest_available: true,
        }
    }
}

define_override!(ValuesSettings => ValuesOverride {
    display_units: DisplayUnits,
    precision: Option<u32>,
    format: Option<String>,
    treat_empty_as_zero: bool,
    show_latest_available: bool,
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarianceSettings {
    /// Absolute difference instead of percent change.
    pub calculate_difference: bool,
    pub precision: u32,
    pub display_units: DisplayUnits,
    pub format: Option<String>,
    pub no_value_label: String,
}

impl Default for VarianceSettings {
    fn default() -> Self {
        Self {
            calculate_difference: false,
            precision: 2,
            display_units: DisplayUnits::None,
            format: None,
            no_value_label: "N/A".to_string(),
        }
    }
}

define_override!(VarianceSettings => VarianceOverride {
    calculate_difference: bool,
    precision: u32,
    display_units: DisplayUnits,
    format: Option<String>,
    no_value_label: String,
});

/// User-entered axis bounds. `None` (or a non-finite value) means "use data".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisBoundsSettings {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

define_override!(AxisBoundsSettings => AxisBoundsOverride {
    min: Option<f64>,
    max: Option<f64>,
});

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparklineAxisSettings {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Take the main axis' resolved bounds.
    pub inherit_values: bool,
}

define_override!(SparklineAxisSettings => SparklineAxisOverride {
    min: Option<f64>,
    max: Option<f64>,
    inherit_values: bool,
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipSettings {
    pub show: bool,
    /// Leading label; empty means the series name.
    pub label: String,
    pub show_variance: bool,
    pub show_date: bool,
    pub show_date_difference: bool,
}

impl Default for TooltipSettings {
    fn default() -> Self {
        Self {
            show: true,
            label: String::new(),
            show_variance: true,
            show_date: true,
            show_date_difference: true,
        }
    }
}

define_override!(TooltipSettings => TooltipOverride {
    show: bool,
    label: String,
    show_variance: bool,
    show_date: bool,
    show_date_difference: bool,
});

/// LOESS parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoessSettings {
    /// Fraction of points in each local window.
    pub bandwidth: f64,
    pub robustness_iters: usize,
    /// Residual threshold below which reweighting stops.
    pub accuracy: f64,
}

impl Default for LoessSettings {
    fn default() -> Self {
        Self { bandwidth: 0.1, robustness_iters: 2, accuracy: 1e-12 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparklineSettings {
    pub interpolate: bool,
    pub loess: LoessSettings,
}

impl Default for SparklineSettings {
    fn default() -> Self {
        Self { interpolate: true, loess: LoessSettings::default() }
    }
}

define_override!(SparklineSettings => SparklineOverride {
    interpolate: bool,
    loess: LoessSettings,
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaleDataSettings {
    pub show: bool,
    pub threshold_days: i64,
    pub deduct_threshold_days: bool,
    /// `${1}` is replaced with the day count.
    pub text: String,
}

impl Default for StaleDataSettings {
    fn default() -> Self {
        Self {
            show: true,
            threshold_days: 0,
            deduct_threshold_days: false,
            text: "Data is ${1} days old".to_string(),
        }
    }
}

define_override!(StaleDataSettings => StaleDataOverride {
    show: bool,
    threshold_days: i64,
    deduct_threshold_days: bool,
    text: String,
});

impl StaleDataSettings {
    pub fn is_stale(&self, days: i64) -> bool {
        self.show && days > self.threshold_days
    }

    pub fn effective_days(&self, days: i64) -> i64 {
        if self.deduct_threshold_days { (days - self.threshold_days).max(0) } else { days }
    }

    pub fn message(&self, days: i64) -> String {
        self.text.replace("${1}", &self.effective_days(days).to_string())
    }
}

/// Settings resolved for one series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSettings {
    pub values: ValuesSettings,
    pub variance: VarianceSettings,
    pub y_axis: AxisBoundsSettings,
    pub sparkline_y_axis: SparklineAxisSettings,
    pub tooltip: TooltipSettings,
    pub sparkline: SparklineSettings,
    pub stale_data: StaleDataSettings,
}

/// Per-column override; absent fields fall through to the card defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSettingsOverride {
    pub values: ValuesOverride,
    pub variance: VarianceOverride,
    pub y_axis: AxisBoundsOverride,
    pub sparkline_y_axis: SparklineAxisOverride,
    pub tooltip: TooltipOverride,
    pub sparkline: SparklineOverride,
    pub stale_data: StaleDataOverride,
}

impl SeriesSettings {
    /// Merge a column override onto the defaults, producing an independent snapshot.
    pub fn resolve(defaults: &SeriesSettings, column: Option<&SeriesSettingsOverride>) -> SeriesSettings {
        let mut out = defaults.clone();
        if let Some(o) = column {
            o.values.apply(&mut out.values);
            o.variance.apply(&mut out.variance);
            o.y_axis.apply(&mut out.y_axis);
            o.sparkline_y_axis.apply(&mut out.sparkline_y_axis);
            o.tooltip.apply(&mut out.tooltip);
            o.sparkline.apply(&mut out.sparkline);
            o.stale_data.apply(&mut out.stale_data);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateSettings {
    /// strftime pattern.
    pub format: String,
    /// Configured variance baseline; a change-start-date column takes precedence.
    pub percent_calc_date: Option<DateTime<Utc>>,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self { format: "%m/%d/%Y".to_string(), percent_calc_date: None }
    }
}

/// Card-level settings as received from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub series: SeriesSettings,
    pub date: DateSettings,
    /// Shown for values that cannot be formatted.
    pub no_value_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            series: SeriesSettings::default(),
            date: DateSettings::default(),
            no_value_label: "N/A".to_string(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
