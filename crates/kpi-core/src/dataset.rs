// File: crates/kpi-core/src/dataset.rs
// Summary: Host tabular dataset: typed cells, role-tagged columns, and the role index.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KpiError, Result};
use crate::settings::SeriesSettingsOverride;

/// One raw cell as handed over by the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl CellValue {
    /// Numeric view of the cell; text is parsed, everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Date view of the cell: dates, epoch milliseconds, or RFC 3339 / `%Y-%m-%d` text.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Number(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
            CellValue::Text(s) => parse_date(s).ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Date(d) => Some(d.to_rfc3339()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self { CellValue::Number(v) }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self { v.map_or(CellValue::Null, CellValue::Number) }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(v: DateTime<Utc>) -> Self { CellValue::Date(v) }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self { CellValue::Text(v.to_string()) }
}

/// Parse RFC 3339 or a bare `%Y-%m-%d` date (midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .ok_or_else(|| KpiError::InvalidDate(s.to_string()))
}

/// Semantic role a column can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Value,
    Tooltip,
    Subtitle,
    WarningState,
    ChangeStartDate,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub display_name: String,
    /// Stable host-side identifier; falls back to the display name when empty.
    pub query_name: String,
    pub format: Option<String>,
    pub roles: BTreeSet<ColumnRole>,
    pub values: Vec<CellValue>,
    pub settings_override: Option<SeriesSettingsOverride>,
}

impl Column {
    pub fn new(display_name: impl Into<String>, role: ColumnRole, values: Vec<CellValue>) -> Self {
        let display_name = display_name.into();
        Self {
            query_name: display_name.clone(),
            display_name,
            roles: BTreeSet::from([role]),
            values,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_override(mut self, o: SeriesSettingsOverride) -> Self {
        self.settings_override = Some(o);
        self
    }

    pub fn has_role(&self, role: ColumnRole) -> bool { self.roles.contains(&role) }

    pub fn key(&self) -> &str {
        if self.query_name.is_empty() { &self.display_name } else { &self.query_name }
    }
}

/// Category columns (dates) plus value columns (measures and side-columns).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub categories: Vec<Column>,
    pub values: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, checking that every column has the same row count.
    pub fn new(categories: Vec<Column>, values: Vec<Column>) -> Result<Self> {
        let expected = categories.first().or(values.first()).map_or(0, |c| c.values.len());
        for c in categories.iter().chain(values.iter()) {
            if c.values.len() != expected {
                return Err(KpiError::ColumnLengthMismatch {
                    column: c.display_name.clone(),
                    got: c.values.len(),
                    expected,
                });
            }
        }
        Ok(Self { categories, values })
    }

    pub fn row_count(&self) -> usize {
        self.categories.first().map_or(0, |c| c.values.len())
    }

    /// Needs a non-empty category column and at least one value column.
    pub fn is_valid(&self) -> bool {
        self.row_count() > 0 && !self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.categories.iter().chain(self.values.iter())
    }

    pub fn role_index(&self) -> RoleIndex<'_> {
        RoleIndex::build(self)
    }
}

/// Columns grouped by role, in dataset order (categories first).
#[derive(Debug, Default)]
pub struct RoleIndex<'a> {
    by_role: HashMap<ColumnRole, Vec<&'a Column>>,
}

impl<'a> RoleIndex<'a> {
    pub fn build(dataset: &'a Dataset) -> Self {
        let mut by_role: HashMap<ColumnRole, Vec<&'a Column>> = HashMap::new();
        for column in dataset.columns() {
            for role in &column.roles {
                by_role.entry(*role).or_default().push(column);
            }
        }
        Self { by_role }
    }

    pub fn get(&self, role: ColumnRole) -> &[&'a Column] {
        self.by_role.get(&role).map_or(&[], Vec::as_slice)
    }

    pub fn first(&self, role: ColumnRole) -> Option<&'a Column> {
        self.get(role).first().copied()
    }
}
