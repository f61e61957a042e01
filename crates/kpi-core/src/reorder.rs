// File: crates/kpi-core/src/reorder.rs
// Summary: Promote a named series to the front of the sorted view (swap for click, overwrite for hover).
// Notes:
// - Both return a new representation; `Series` values are shared, never cloned.
// - Only `sorted_series` changes; `series` keeps the canonical pivot order.

use crate::series::DataRepresentation;

fn position(representation: &DataRepresentation, name: &str) -> Option<usize> {
    representation.sorted_series.iter().position(|s| s.name == name)
}

/// Exchange the named series with position 0. No-op when the name is unknown.
pub fn swap_to_front(representation: &DataRepresentation, name: &str) -> DataRepresentation {
    let mut out = representation.clone();
    if let Some(i) = position(representation, name) {
        out.sorted_series.swap(0, i);
    }
    out
}

/// Overwrite position 0 with the named series; the former first entry leaves the view
/// and the named series appears twice. Used for transient hover previews.
pub fn overwrite_front(representation: &DataRepresentation, name: &str) -> DataRepresentation {
    let mut out = representation.clone();
    if let Some(i) = position(representation, name) {
        let promoted = out.sorted_series[i].clone();
        out.sorted_series[0] = promoted;
    }
    out
}
