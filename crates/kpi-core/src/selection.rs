// File: crates/kpi-core/src/selection.rs
// Summary: Opaque host selection identity and the factory that mints one per series.

use std::fmt;

use crate::dataset::Column;

/// Host-owned identity token. The core only carries and compares it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(String);

impl SelectionId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait SelectionIdFactory {
    fn create(&self, column: &Column, column_index: usize) -> SelectionId;
}

/// Default factory: one identity per value column, keyed by its query name.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColumnSelectionIds;

impl SelectionIdFactory for ColumnSelectionIds {
    fn create(&self, column: &Column, _column_index: usize) -> SelectionId {
        SelectionId::new(column.key())
    }
}

impl<F> SelectionIdFactory for F
where
    F: Fn(&Column, usize) -> SelectionId,
{
    fn create(&self, column: &Column, column_index: usize) -> SelectionId {
        self(column, column_index)
    }
}
