// File: crates/kpi-core/src/axis.rs
// Summary: Axis model: running min/max bounds, data-derived initial bounds, and a scale.

use chrono::{DateTime, Utc};

use crate::scale::{Scale, ScaleKind};

/// Values an axis can track. `to_domain` feeds the scale.
pub trait AxisValue: Copy + PartialOrd {
    const KIND: ScaleKind;
    fn to_domain(self) -> f64;
}

impl AxisValue for f64 {
    const KIND: ScaleKind = ScaleKind::Numeric;
    fn to_domain(self) -> f64 { self }
}

impl AxisValue for DateTime<Utc> {
    const KIND: ScaleKind = ScaleKind::Time;
    fn to_domain(self) -> f64 { self.timestamp_millis() as f64 }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    initial_min: Option<T>,
    initial_max: Option<T>,
    initial_captured: bool,
    pub scale: Scale,
}

pub type TimeAxis = Axis<DateTime<Utc>>;
pub type ValueAxis = Axis<f64>;

impl<T> Default for Axis<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            initial_min: None,
            initial_max: None,
            initial_captured: false,
            scale: Scale::default(),
        }
    }
}

impl<T: AxisValue> Axis<T> {
    pub fn new() -> Self { Self::default() }

    /// Widen the bounds to include `value`.
    pub fn include(&mut self, value: T) {
        match self.min {
            Some(m) if !(value < m) => {}
            _ => self.min = Some(value),
        }
        match self.max {
            Some(m) if !(value > m) => {}
            _ => self.max = Some(value),
        }
    }

    /// Record the current bounds as the data-derived initial domain. Only the first call counts.
    pub fn capture_initial(&mut self) {
        if self.initial_captured {
            return;
        }
        self.initial_min = self.min;
        self.initial_max = self.max;
        self.initial_captured = true;
    }

    pub fn initial_min(&self) -> Option<T> { self.initial_min }
    pub fn initial_max(&self) -> Option<T> { self.initial_max }

    pub fn swap_if_inverted(&mut self) {
        if let (Some(lo), Some(hi)) = (self.min, self.max) {
            if lo > hi {
                self.min = Some(hi);
                self.max = Some(lo);
            }
        }
    }

    /// Rebuild the scale domain from `[min, max]`; unset when either bound is missing.
    pub fn apply_domain(&mut self) {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => self.scale.set_domain(&[lo.to_domain(), hi.to_domain()], T::KIND),
            _ => self.scale.set_domain(&[], ScaleKind::None),
        }
    }
}
