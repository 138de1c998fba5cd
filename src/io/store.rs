//! Table storage.
//!
//! Storage is reached only through `StorageSink` / `StorageSource`, passed in
//! explicitly by the caller. Stores persist columns, never a row index.
//!
//! `CsvTableStore` keeps each table as two files under a root directory:
//!
//! - `<name>.csv`: header row + data rows
//! - `<name>.schema.json`: column names and kinds, used to restore types on read

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Column, ColumnData, ColumnKind, Table, WriteMode};
use crate::error::AppError;
use crate::io::export::write_table_csv_file;

/// Result of a write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { rows: usize, columns: usize },
    /// `WriteMode::Ignore` and the table already existed.
    Skipped,
}

pub trait StorageSink {
    fn write(&mut self, table: &Table, name: &str, mode: WriteMode) -> Result<WriteOutcome, AppError>;
}

pub trait StorageSource {
    fn read(&self, name: &str) -> Result<Table, AppError>;
}

/// Table names: non-empty ASCII alphanumerics and underscores.
pub fn validate_table_name(name: &str) -> Result<(), AppError> {
    let ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::new(
            2,
            format!("Invalid table name '{name}': use ASCII letters, digits and '_'."),
        ))
    }
}

/// A stored table needs at least one column; names must be unique and free of spaces.
pub fn validate_columns(table: &Table) -> Result<(), AppError> {
    if table.n_columns() == 0 {
        return Err(AppError::new(2, "A table without columns cannot be stored."));
    }
    let mut seen = HashSet::new();
    for name in table.column_names() {
        if name.is_empty() {
            return Err(AppError::new(2, "Empty column names cannot be stored."));
        }
        if name.contains(' ') {
            return Err(AppError::new(
                2,
                format!("Column name '{name}' contains spaces and cannot be stored."),
            ));
        }
        if !seen.insert(name) {
            return Err(AppError::new(2, format!("Duplicate column name '{name}'.")));
        }
    }
    Ok(())
}

/// Decide whether a write should proceed given the mode and whether the table exists.
fn check_mode(name: &str, mode: WriteMode, exists: bool) -> Result<bool, AppError> {
    match (mode, exists) {
        (_, false) | (WriteMode::Overwrite, true) => Ok(true),
        (WriteMode::Ignore, true) => {
            info!(table = name, "table exists; skipping write");
            Ok(false)
        }
        (WriteMode::ErrorIfExists, true) => {
            Err(AppError::new(2, format!("Table '{name}' already exists.")))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaFile {
    table: String,
    columns: Vec<SchemaColumn>,
    rows: usize,
    written_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaColumn {
    name: String,
    kind: ColumnKind,
}

/// Directory-backed table store.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    root: PathBuf,
}

impl CsvTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    pub fn schema_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.schema.json"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.schema_path(name).exists()
    }
}

impl StorageSink for CsvTableStore {
    fn write(&mut self, table: &Table, name: &str, mode: WriteMode) -> Result<WriteOutcome, AppError> {
        validate_table_name(name)?;
        validate_columns(table)?;
        if !check_mode(name, mode, self.exists(name))? {
            return Ok(WriteOutcome::Skipped);
        }

        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to create store directory '{}': {e}", self.root.display()),
            )
        })?;

        // Stage both files, then rename. A failed stage leaves the previous table untouched.
        let data_path = self.data_path(name);
        let schema_path = self.schema_path(name);
        let data_tmp = staging_path(&data_path);
        let schema_tmp = staging_path(&schema_path);

        let schema = SchemaFile {
            table: name.to_string(),
            columns: table
                .columns()
                .iter()
                .map(|c| SchemaColumn {
                    name: c.name.clone(),
                    kind: c.data.kind(),
                })
                .collect(),
            rows: table.n_rows(),
            written_at: Utc::now(),
        };

        let staged = write_table_csv_file(&data_tmp, table).and_then(|()| write_schema(&schema_tmp, &schema));
        if let Err(e) = staged {
            let _ = fs::remove_file(&data_tmp);
            let _ = fs::remove_file(&schema_tmp);
            return Err(e);
        }
        promote(&data_tmp, &data_path)?;
        promote(&schema_tmp, &schema_path)?;

        info!(
            table = name,
            rows = table.n_rows(),
            columns = table.n_columns(),
            path = %data_path.display(),
            "table written"
        );
        Ok(WriteOutcome::Written {
            rows: table.n_rows(),
            columns: table.n_columns(),
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_schema(path: &Path, schema: &SchemaFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, schema)
        .map_err(|e| AppError::new(2, format!("Failed to write table schema: {e}")))
}

fn promote(from: &Path, to: &Path) -> Result<(), AppError> {
    fs::rename(from, to).map_err(|e| {
        AppError::new(2, format!("Failed to move '{}' into place: {e}", to.display()))
    })
}

impl StorageSource for CsvTableStore {
    fn read(&self, name: &str) -> Result<Table, AppError> {
        validate_table_name(name)?;
        if !self.exists(name) {
            return Err(AppError::new(
                2,
                format!("Table '{name}' not found in '{}'.", self.root.display()),
            ));
        }

        let schema_path = self.schema_path(name);
        let file = File::open(&schema_path).map_err(|e| {
            AppError::new(2, format!("Failed to open '{}': {e}", schema_path.display()))
        })?;
        let schema: SchemaFile = serde_json::from_reader(file)
            .map_err(|e| AppError::new(2, format!("Invalid table schema '{}': {e}", schema_path.display())))?;

        let data_path = self.data_path(name);
        let mut reader = csv::Reader::from_path(&data_path).map_err(|e| {
            AppError::new(2, format!("Failed to open '{}': {e}", data_path.display()))
        })?;

        let headers = reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read table header: {e}")))?
            .clone();
        let expected: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        if headers.iter().collect::<Vec<_>>() != expected {
            return Err(AppError::new(
                2,
                format!("Table '{name}' data does not match its schema."),
            ));
        }

        let mut data: Vec<ColumnData> = schema
            .columns
            .iter()
            .map(|c| match c.kind {
                ColumnKind::Float => ColumnData::Float(Vec::with_capacity(schema.rows)),
                ColumnKind::Date => ColumnData::Date(Vec::with_capacity(schema.rows)),
            })
            .collect();

        for (idx, result) in reader.records().enumerate() {
            let line = idx + 2;
            let record = result
                .map_err(|e| AppError::new(2, format!("Table '{name}' line {line}: {e}")))?;
            for (cell, column) in record.iter().zip(data.iter_mut()) {
                match column {
                    ColumnData::Float(values) => {
                        let v = cell.parse::<f64>().map_err(|_| {
                            AppError::new(2, format!("Table '{name}' line {line}: invalid number '{cell}'."))
                        })?;
                        values.push(v);
                    }
                    ColumnData::Date(values) => {
                        let d = crate::io::ingest::parse_date(cell)
                            .map_err(|e| AppError::new(2, format!("Table '{name}' line {line}: {e}")))?;
                        values.push(d);
                    }
                }
            }
        }

        let columns = schema
            .columns
            .into_iter()
            .zip(data)
            .map(|(c, data)| Column { name: c.name, data })
            .collect();
        Table::from_columns(columns)
    }
}

/// In-memory table store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl StorageSink for MemoryStore {
    fn write(&mut self, table: &Table, name: &str, mode: WriteMode) -> Result<WriteOutcome, AppError> {
        validate_table_name(name)?;
        validate_columns(table)?;
        if !check_mode(name, mode, self.tables.contains_key(name))? {
            return Ok(WriteOutcome::Skipped);
        }
        self.tables.insert(name.to_string(), table.clone());
        Ok(WriteOutcome::Written {
            rows: table.n_rows(),
            columns: table.n_columns(),
        })
    }
}

impl StorageSource for MemoryStore {
    fn read(&self, name: &str) -> Result<Table, AppError> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::new(2, format!("Table '{name}' not found.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    fn sample_table() -> Table {
        Table::from_columns(vec![
            Column::float("Daily_ICU_occupancy", vec![1.0, 2.5]),
            Column::float("Weekly_new_hospital_admissions", vec![0.0, 1234.0]),
            Column::date("date", vec![d(1), d(2)]),
        ])
        .unwrap()
    }

    #[test]
    fn csv_store_round_trips_typed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvTableStore::new(dir.path().join("tables"));

        let outcome = store.write(&sample_table(), "covid_stats", WriteMode::Overwrite).unwrap();
        assert_eq!(outcome, WriteOutcome::Written { rows: 2, columns: 3 });

        let csv = std::fs::read_to_string(store.data_path("covid_stats")).unwrap();
        assert_eq!(
            csv,
            "Daily_ICU_occupancy,Weekly_new_hospital_admissions,date\n\
             1,0,2021-03-01\n\
             2.5,1234,2021-03-02\n"
        );

        let back = store.read("covid_stats").unwrap();
        assert_eq!(back, sample_table());
    }

    #[test]
    fn csv_store_round_trips_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvTableStore::new(dir.path());
        let empty = Table::from_columns(vec![Column::date("date", Vec::new())]).unwrap();

        store.write(&empty, "empty", WriteMode::Overwrite).unwrap();
        let back = store.read("empty").unwrap();
        assert_eq!(back.n_rows(), 0);
        assert_eq!(back.column_names(), vec!["date"]);
    }

    #[test]
    fn tables_without_columns_are_rejected_by_every_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv_store = CsvTableStore::new(dir.path());
        let err = csv_store.write(&Table::new(), "z", WriteMode::Overwrite).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(!csv_store.exists("z"));
        assert!(!csv_store.data_path("z").exists());

        let mut memory = MemoryStore::new();
        let err = memory.write(&Table::new(), "z", WriteMode::Overwrite).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(memory.is_empty());
    }

    #[test]
    fn failed_overwrite_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvTableStore::new(dir.path());
        store.write(&sample_table(), "t", WriteMode::Overwrite).unwrap();

        // A directory squatting on the staging path makes the schema write fail.
        std::fs::create_dir(staging_path(&store.schema_path("t"))).unwrap();
        let smaller = Table::from_columns(vec![Column::float("x", vec![9.0])]).unwrap();
        assert!(store.write(&smaller, "t", WriteMode::Overwrite).is_err());

        assert_eq!(store.read("t").unwrap(), sample_table());
        assert!(!staging_path(&store.data_path("t")).exists());
    }

    #[test]
    fn overwrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvTableStore::new(dir.path());
        store.write(&sample_table(), "t", WriteMode::Overwrite).unwrap();

        let smaller = Table::from_columns(vec![Column::float("x", vec![9.0])]).unwrap();
        store.write(&smaller, "t", WriteMode::Overwrite).unwrap();

        assert_eq!(store.read("t").unwrap(), smaller);
        assert!(!staging_path(&store.data_path("t")).exists());
        assert!(!staging_path(&store.schema_path("t")).exists());
    }

    #[test]
    fn error_and_ignore_modes() {
        let mut store = MemoryStore::new();
        store.write(&sample_table(), "t", WriteMode::ErrorIfExists).unwrap();

        let err = store.write(&sample_table(), "t", WriteMode::ErrorIfExists).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let other = Table::from_columns(vec![Column::float("x", vec![1.0])]).unwrap();
        assert_eq!(store.write(&other, "t", WriteMode::Ignore).unwrap(), WriteOutcome::Skipped);
        assert_eq!(store.read("t").unwrap(), sample_table());
    }

    #[test]
    fn rejects_unstorable_names() {
        let mut store = MemoryStore::new();
        assert!(store.write(&sample_table(), "bad name", WriteMode::Overwrite).is_err());

        let spaced = Table::from_columns(vec![Column::float("new cases", vec![1.0])]).unwrap();
        assert!(store.write(&spaced, "t", WriteMode::Overwrite).is_err());

        let dup = Table::from_columns(vec![
            Column::float("a", vec![1.0]),
            Column::float("a", vec![2.0]),
        ])
        .unwrap();
        assert!(store.write(&dup, "t", WriteMode::Overwrite).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn reading_missing_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvTableStore::new(dir.path());
        let err = store.read("nope").unwrap_err();
        assert!(err.message().contains("not found"));
    }
}
