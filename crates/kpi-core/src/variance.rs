// File: crates/kpi-core/src/variance.rs
// Summary: Variance strategies (percent change vs absolute difference) between two points.

use crate::series::Point;
use crate::validity::is_valid;

/// Computes a difference between a baseline point and a later point. Never panics;
/// missing or non-finite inputs yield NaN.
pub trait VarianceConverter {
    fn id(&self) -> &'static str;
    fn convert(&self, first: Option<&Point>, second: Option<&Point>) -> f64;
}

/// `(second - first) / first`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PercentChange;

impl VarianceConverter for PercentChange {
    fn id(&self) -> &'static str { "percent" }

    fn convert(&self, first: Option<&Point>, second: Option<&Point>) -> f64 {
        let Some((a, b)) = usable_pair(first, second) else { return f64::NAN };
        if a == 0.0 {
            return f64::NAN;
        }
        let v = (b - a) / a;
        if is_valid(v) { v } else { f64::NAN }
    }
}

/// `second - first`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsoluteDifference;

impl VarianceConverter for AbsoluteDifference {
    fn id(&self) -> &'static str { "difference" }

    fn convert(&self, first: Option<&Point>, second: Option<&Point>) -> f64 {
        let Some((a, b)) = usable_pair(first, second) else { return f64::NAN };
        let v = b - a;
        if is_valid(v) { v } else { f64::NAN }
    }
}

/// Strategy for the "calculate difference" flag.
pub fn converter_for(calculate_difference: bool) -> &'static dyn VarianceConverter {
    if calculate_difference { &AbsoluteDifference } else { &PercentChange }
}

fn usable_pair(first: Option<&Point>, second: Option<&Point>) -> Option<(f64, f64)> {
    let (a, b) = (first?.y, second?.y);
    (is_valid(a) && is_valid(b)).then_some((a, b))
}
