//! CSV ingest for long-format observation files.
//!
//! This module turns a `(iso_code, date, indicator, value)` CSV into
//! `LongRecord`s. It does not filter or coerce values; that is the job of the
//! reshape stages.
//!
//! - **Strict schema** for required columns (exit code 2)
//! - **Row-level validation** for keys and dates (skip bad rows, report them)
//! - values are kept as raw text, except for empty cells and NA tokens

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{LongRecord, ObservedValue};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 4] = ["iso_code", "date", "indicator", "value"];

/// Cell contents read as missing values.
const NA_TOKENS: [&str; 13] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>", "#NA",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed records + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<LongRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }
}

/// Read long-format records from any CSV reader.
pub fn read_long_records<R: Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => records.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped malformed rows during ingest");
    }
    debug!(rows_read, rows_used = records.len(), "ingest finished");

    Ok(IngestedData {
        records,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }
    Ok(())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<LongRecord, String> {
    let location_code = get_required(record, header_map, "iso_code")?.to_string();
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let indicator = get_required(record, header_map, "indicator")?.to_string();
    let entity = get_optional(record, header_map, "entity").map(str::to_string);

    let value = match get_optional(record, header_map, "value") {
        None => ObservedValue::Missing,
        Some(s) if NA_TOKENS.contains(&s) => ObservedValue::Missing,
        Some(s) => ObservedValue::text(s),
    };

    Ok(LongRecord {
        location_code,
        entity,
        date,
        indicator,
        value,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY."
    ))
}
