//! The reshape pipeline: long observations → storage-ready wide table.
//!
//! Stages run in a fixed order:
//!
//! 1. `filter_by_location`
//! 2. `coerce_and_pivot` (numeric coercion, fill, long → wide)
//! 3. `normalize_column_names`
//! 4. `materialize_index_column`
//!
//! Normalizing before the pivot would be a no-op, since indicator-derived
//! column names only exist after it.

use tracing::{debug, warn};

use crate::domain::{Column, LongRecord, ReshapeConfig, WideTable};
use crate::error::ReshapeError;

pub mod pivot;

pub use pivot::{coerce_and_pivot, coerce_value};

/// Keep the rows for one location, preserving order.
pub fn filter_by_location(rows: &[LongRecord], location_code: &str) -> Vec<LongRecord> {
    rows.iter()
        .filter(|r| r.location_code == location_code)
        .cloned()
        .collect()
}

/// Replace spaces in column names with underscores.
///
/// Only spaces are touched; other characters pass through.
pub fn normalize_column_names(mut wide: WideTable) -> WideTable {
    for column in wide.table_mut().columns_mut() {
        if column.name.contains(' ') {
            column.name = column.name.replace(' ', "_");
        }
    }
    wide
}

/// Copy the date index into an explicit column named `column_name`.
///
/// The index stays in place. An existing column with the same name is replaced.
pub fn materialize_index_column(mut wide: WideTable, column_name: &str) -> WideTable {
    let dates = wide.index().to_vec();
    wide.table_mut().upsert_column(Column::date(column_name, dates));
    wide
}

/// Run all four stages.
pub fn reshape(rows: &[LongRecord], config: &ReshapeConfig) -> Result<WideTable, ReshapeError> {
    let filtered = filter_by_location(rows, &config.location_code);
    debug!(
        location = %config.location_code,
        rows_in = rows.len(),
        rows_out = filtered.len(),
        "filtered by location"
    );
    if filtered.is_empty() {
        warn!(
            location = %config.location_code,
            "no rows for location; the resulting table is empty"
        );
    }

    let wide = coerce_and_pivot(
        &filtered,
        config.fill_value,
        config.duplicate_policy,
        &config.index_column,
    )?;
    let wide = normalize_column_names(wide);
    Ok(materialize_index_column(wide, &config.index_column))
}
