// File: crates/kpi-core/src/scale.rs
// Summary: Time/numeric domain -> pixel range mapping with invert and domain introspection.

use chrono::{DateTime, TimeZone, Utc};

/// Kind of values a scale's domain holds. Time domains are epoch milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScaleKind {
    Time,
    Numeric,
    #[default]
    None,
}

/// Linear mapping from a domain to a range.
///
/// An unset scale (empty domain, or kind `None`) maps everything to `0.0`
/// and cannot invert. `Clone` yields a fully independent scale, which is how
/// the same domain gets reused with different ranges (main chart, sparkline).
#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    kind: ScaleKind,
    domain: Vec<f64>,
    range: (f64, f64),
}

impl Default for Scale {
    fn default() -> Self {
        Self { kind: ScaleKind::None, domain: Vec::new(), range: (0.0, 1.0) }
    }
}

impl Scale {
    pub fn new() -> Self { Self::default() }

    /// Set the domain. Empty input or `ScaleKind::None` leaves the scale unset.
    pub fn set_domain(&mut self, values: &[f64], kind: ScaleKind) {
        if values.is_empty() || kind == ScaleKind::None {
            self.kind = ScaleKind::None;
            self.domain.clear();
            return;
        }
        self.kind = kind;
        self.domain = if values.len() == 1 { vec![values[0], values[0]] } else { values.to_vec() };
    }

    pub fn set_time_domain(&mut self, values: &[DateTime<Utc>]) {
        let millis: Vec<f64> = values.iter().map(|d| d.timestamp_millis() as f64).collect();
        self.set_domain(&millis, ScaleKind::Time);
    }

    /// Set the output interval. Call after `set_domain`.
    pub fn set_range(&mut self, start: f64, end: f64) {
        self.range = (start, end);
    }

    /// Copy of this scale mapped onto another output interval.
    pub fn with_range(&self, start: f64, end: f64) -> Self {
        let mut s = self.clone();
        s.set_range(start, end);
        s
    }

    pub fn is_set(&self) -> bool { !self.domain.is_empty() }

    pub fn kind(&self) -> ScaleKind { self.kind }

    /// Domain as given; empty when unset.
    pub fn domain(&self) -> &[f64] { &self.domain }

    pub fn range(&self) -> (f64, f64) { self.range }

    fn ends(&self) -> Option<(f64, f64)> {
        Some((*self.domain.first()?, *self.domain.last()?))
    }

    /// Map a domain value into the range. Unset scales return `0.0`.
    pub fn scale(&self, value: f64) -> f64 {
        let Some((d0, d1)) = self.ends() else { return 0.0 };
        let (r0, r1) = self.range;
        let span = d1 - d0;
        // zero-width domain maps onto the middle of the range
        let t = if span == 0.0 { 0.5 } else { (value - d0) / span };
        r0 + t * (r1 - r0)
    }

    pub fn scale_time(&self, value: DateTime<Utc>) -> f64 {
        self.scale(value.timestamp_millis() as f64)
    }

    /// Map a range coordinate back into the domain.
    pub fn invert(&self, value: f64) -> Option<f64> {
        let (d0, d1) = self.ends()?;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return Some(d0);
        }
        Some(d0 + (value - r0) / span * (d1 - d0))
    }

    pub fn invert_time(&self, value: f64) -> Option<DateTime<Utc>> {
        if self.kind != ScaleKind::Time {
            return None;
        }
        let ms = self.invert(value)?;
        if !ms.is_finite() {
            return None;
        }
        Utc.timestamp_millis_opt(ms.round() as i64).single()
    }
}
