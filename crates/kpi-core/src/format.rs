// File: crates/kpi-core/src/format.rs
// Summary: Number/variance/date formatting with display-unit suffixes and fallback labels.
// Notes:
// - Patterns are a small subset of host format strings: literal prefix/suffix,
//   `,` for grouping, `0`/`#` digits after `.` for decimals, `%` for percent.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::settings::{DisplayUnits, ValuesSettings, VarianceSettings};
use crate::validity::is_valid;

pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Resolved numeric format descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NumberFormat {
    pub display_units: DisplayUnits,
    pub precision: Option<u32>,
    pub format: Option<String>,
}

impl NumberFormat {
    /// Value settings, with the column's own format string as a fallback pattern.
    pub fn for_values(values: &ValuesSettings, column_format: Option<&str>) -> Self {
        Self {
            display_units: values.display_units,
            precision: values.precision,
            format: values.format.clone().or_else(|| column_format.map(str::to_string)),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Pattern<'a> {
    prefix: &'a str,
    suffix: &'a str,
    grouping: bool,
    decimals: Option<u32>,
    percent: bool,
}

/// Upper bound on rendered decimals.
const MAX_PRECISION: usize = 20;

fn is_digit_token(c: char) -> bool {
    matches!(c, '0' | '#' | ',')
}

/// The number body runs from the first to the last digit token; a `.` joins it only
/// when a digit token follows.
fn parse_pattern(pattern: &str) -> Pattern<'_> {
    let Some(mut start) = pattern.find(is_digit_token) else {
        return Pattern { prefix: pattern, percent: pattern.contains('%'), ..Default::default() };
    };
    if pattern[..start].ends_with('.') {
        start -= 1;
    }
    let end = pattern.rfind(is_digit_token).map_or(pattern.len(), |i| i + 1);
    let body = &pattern[start..end];
    let decimals = body
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count() as u32);
    let (prefix, suffix) = (&pattern[..start], &pattern[end..]);
    Pattern {
        prefix,
        suffix,
        grouping: body.contains(','),
        decimals,
        percent: prefix.contains('%') || suffix.contains('%'),
    }
}

/// Divisor and suffix for a display unit; `Auto` picks by magnitude.
pub fn display_unit(units: DisplayUnits, value: f64) -> (f64, &'static str) {
    const K: (f64, &str) = (1e3, "K");
    const M: (f64, &str) = (1e6, "M");
    const BN: (f64, &str) = (1e9, "bn");
    const T: (f64, &str) = (1e12, "T");
    match units {
        DisplayUnits::None => (1.0, ""),
        DisplayUnits::Thousands => K,
        DisplayUnits::Millions => M,
        DisplayUnits::Billions => BN,
        DisplayUnits::Trillions => T,
        DisplayUnits::Auto => {
            let a = value.abs();
            if a >= T.0 { T } else if a >= BN.0 { BN } else if a >= M.0 { M } else if a >= K.0 { K } else { (1.0, "") }
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let mut out = String::with_capacity(int.len() + int.len() / 3 + 8);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Format a number, or return `fallback` when it is not a usable value.
pub fn format_value(value: f64, fmt: &NumberFormat, fallback: &str) -> String {
    if !is_valid(value) {
        return fallback.to_string();
    }
    let pattern = fmt.format.as_deref().map(parse_pattern).unwrap_or_default();

    let mut v = if pattern.percent { value * 100.0 } else { value };
    let (divisor, unit) = if pattern.percent { (1.0, "") } else { display_unit(fmt.display_units, v) };
    v /= divisor;

    let decimals = fmt.precision.or(pattern.decimals).unwrap_or_else(|| {
        if divisor > 1.0 { 2 } else if v.fract() == 0.0 { 0 } else { 2 }
    }) as usize;
    let decimals = decimals.min(MAX_PRECISION);

    let digits = format!("{:.*}", decimals, v.abs());
    let digits = if pattern.grouping { group_thousands(&digits) } else { digits };
    let negative = v < 0.0 && digits.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };

    format!("{sign}{}{digits}{unit}{}", pattern.prefix, pattern.suffix)
}

/// Percent mode renders `value * 100` with `%`; difference mode uses the variance units.
pub fn format_variance(value: f64, settings: &VarianceSettings) -> String {
    let fmt = if settings.calculate_difference {
        NumberFormat {
            display_units: settings.display_units,
            precision: Some(settings.precision),
            format: settings.format.clone(),
        }
    } else {
        NumberFormat {
            display_units: DisplayUnits::None,
            precision: Some(settings.precision),
            format: Some(settings.format.clone().filter(|f| f.contains('%')).unwrap_or_else(|| "0%".to_string())),
        }
    };
    format_value(value, &fmt, &settings.no_value_label)
}

/// strftime formatting; an invalid pattern falls back to `DEFAULT_DATE_FORMAT`.
pub fn format_date(date: DateTime<Utc>, pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return date.format(DEFAULT_DATE_FORMAT).to_string();
    }
    date.format_with_items(items.iter()).to_string()
}
