//! Write a table as plain CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! The table store uses the same layout for its data files.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Table;
use crate::error::AppError;

/// Write `table` (header + rows) to any writer.
pub fn write_table_csv<W: Write>(out: W, table: &Table) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(table.column_names())
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for row in 0..table.n_rows() {
        let cells = table
            .columns()
            .iter()
            .map(|c| c.data.cell_text(row).unwrap_or_default());
        writer
            .write_record(cells)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}

/// Write `table` to a CSV file, replacing it if present.
pub fn write_table_csv_file(path: &Path, table: &Table) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table_csv(file, table)
}
