// File: crates/kpi-core/src/error.rs
// Summary: Error type for dataset construction and settings/date parsing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KpiError>;

/// Errors raised at input boundaries. Conversion itself never fails.
#[derive(Debug, Error)]
pub enum KpiError {
    #[error("column '{column}' has {got} rows, expected {expected}")]
    ColumnLengthMismatch { column: String, got: usize, expected: usize },

    #[error("invalid settings document: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("unrecognized date '{0}'")]
    InvalidDate(String),
}
