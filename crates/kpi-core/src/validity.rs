// File: crates/kpi-core/src/validity.rs
// Summary: Predicates separating usable numbers from null/NaN/infinite values.

/// True when `value` is present and finite.
#[inline]
pub fn is_value_valid(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite())
}

/// True when `value` is finite (NaN and +/-inf are rejected).
#[inline]
pub fn is_valid(value: f64) -> bool {
    value.is_finite()
}

/// Variance uses the same rule; NaN variance means "not available".
#[inline]
pub fn is_variance_valid(variance: f64) -> bool {
    is_valid(variance)
}
