//! Shared domain types.
//!
//! Two shapes flow through the pipeline:
//!
//! - long observations (`LongRecord`), one per (location, date, indicator)
//! - typed tables (`Table`), optionally carrying a date row index (`WideTable`)
//!
//! Tables are plain ordered lists of named, typed columns. The row index of a
//! `WideTable` lives outside of its `Table`: storage only ever
//! sees the columns.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw value of an observation as read from the source.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedValue {
    /// Empty cell or a recognized NA token.
    Missing,
    Number(f64),
    /// Unparsed text; numeric coercion happens during reshape.
    Text(String),
}

impl ObservedValue {
    pub fn text(s: impl Into<String>) -> Self {
        ObservedValue::Text(s.into())
    }
}

/// One long-format observation.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub location_code: String,
    /// Human-readable location name, when the source has one.
    pub entity: Option<String>,
    pub date: NaiveDate,
    pub indicator: String,
    pub value: ObservedValue,
}

impl LongRecord {
    pub fn new(
        location_code: impl Into<String>,
        date: NaiveDate,
        indicator: impl Into<String>,
        value: ObservedValue,
    ) -> Self {
        Self {
            location_code: location_code.into(),
            entity: None,
            date,
            indicator: indicator.into(),
            value,
        }
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Float,
    Date,
}

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Date(Vec<NaiveDate>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Date(_) => ColumnKind::Date,
        }
    }

    /// Text rendering of one cell (used by previews and the CSV store).
    ///
    /// Floats use Rust's shortest round-trip formatting, dates are ISO.
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Float(v) => v.get(row).map(|x| x.to_string()),
            ColumnData::Date(v) => v.get(row).map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Float(values),
        }
    }

    pub fn date(name: impl Into<String>, values: Vec<NaiveDate>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Date(values),
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Float(v) => Some(v),
            ColumnData::Date(_) => None,
        }
    }

    pub fn as_dates(&self) -> Option<&[NaiveDate]> {
        match &self.data {
            ColumnData::Date(v) => Some(v),
            ColumnData::Float(_) => None,
        }
    }
}

/// Ordered set of named, typed columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting columns of unequal length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, AppError> {
        if let Some(first) = columns.first() {
            let n = first.data.len();
            if let Some(bad) = columns.iter().find(|c| c.data.len() != n) {
                return Err(AppError::new(
                    2,
                    format!(
                        "Column '{}' has {} rows, expected {n} (from column '{}').",
                        bad.name,
                        bad.data.len(),
                        first.name
                    ),
                ));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Replace the column with the same name in place, or append it.
    ///
    /// Callers must pass a column of `n_rows()` length.
    pub(crate) fn upsert_column(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }
}

/// A table indexed by date (one row per index entry).
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    index_name: String,
    index: Vec<NaiveDate>,
    table: Table,
}

impl WideTable {
    pub fn new(index_name: impl Into<String>, index: Vec<NaiveDate>, table: Table) -> Result<Self, AppError> {
        if table.n_columns() > 0 && table.n_rows() != index.len() {
            return Err(AppError::new(
                2,
                format!(
                    "Index has {} entries but table has {} rows.",
                    index.len(),
                    table.n_rows()
                ),
            ));
        }
        Ok(Self {
            index_name: index_name.into(),
            index,
            table,
        })
    }

    /// Assemble a table whose columns are known to match the index length.
    pub(crate) fn from_parts(index_name: &str, index: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.data.len() == index.len()));
        Self {
            index_name: index_name.to_string(),
            index,
            table: Table { columns },
        }
    }

    pub fn empty(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            index: Vec::new(),
            table: Table::new(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table.column(name)
    }

    /// First and last index entries.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.index.first()?, *self.index.last()?))
    }

    pub(crate) fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }
}

/// How to resolve two observations that share a (date, indicator) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Average all values for the key.
    #[default]
    Mean,
    /// Keep the value that appears last in the input.
    Last,
    /// Fail the run.
    Error,
}

/// Configuration of the reshape stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ReshapeConfig {
    pub location_code: String,
    pub fill_value: f64,
    /// Name of the explicit column the date index is copied into.
    pub index_column: String,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            location_code: "DZA".to_string(),
            fill_value: 0.0,
            index_column: "date".to_string(),
            duplicate_policy: DuplicatePolicy::Mean,
        }
    }
}

/// What to do when the target table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Replace the existing table.
    #[default]
    Overwrite,
    /// Fail if the table exists.
    ErrorIfExists,
    /// Leave the existing table untouched.
    Ignore,
}

/// Run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// File path or http(s) URL of the long-format CSV.
    pub source: String,
    pub reshape: ReshapeConfig,

    pub store_dir: PathBuf,
    pub table_name: String,
    pub write_mode: WriteMode,
    /// Skip the storage step entirely.
    pub write: bool,

    pub preview_rows: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}
