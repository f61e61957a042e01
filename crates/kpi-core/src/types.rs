// File: crates/kpi-core/src/types.rs
// Summary: Shared types: viewport dimensions and their discrete size buckets.

use serde::{Deserialize, Serialize};

/// Host viewport in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Discrete viewport size, ordered smallest to largest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportSize {
    Tiny,
    Small,
    Medium,
    Normal,
    Big,
    Huge,
    Enormous,
}

/// (bucket, max height, max width); either dimension at or below its limit selects the bucket.
const THRESHOLDS: [(ViewportSize, f64, f64); 6] = [
    (ViewportSize::Tiny, 120.0, 220.0),
    (ViewportSize::Small, 220.0, 320.0),
    (ViewportSize::Medium, 320.0, 520.0),
    (ViewportSize::Normal, 420.0, 720.0),
    (ViewportSize::Big, 620.0, 920.0),
    (ViewportSize::Huge, 800.0, 1200.0),
];

impl ViewportSize {
    pub fn from_dimensions(height: f64, width: f64) -> Self {
        for &(size, max_h, max_w) in &THRESHOLDS {
            if height <= max_h || width <= max_w {
                return size;
            }
        }
        ViewportSize::Enormous
    }
}

impl From<Viewport> for ViewportSize {
    fn from(v: Viewport) -> Self {
        Self::from_dimensions(v.height, v.width)
    }
}
