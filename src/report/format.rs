//! Formatted terminal output: run summary and table previews.
//!
//! Formatting lives here so the pipeline code stays free of presentation and
//! output changes stay localized.

use crate::app::pipeline::RunOutput;
use crate::domain::{ColumnKind, RunConfig, Table};
use crate::io::store::WriteOutcome;

/// Row errors listed in the summary before eliding the rest.
const MAX_LISTED_ROW_ERRORS: usize = 5;

/// Format the run summary (ingest counts, reshape shape, storage outcome).
pub fn format_run_summary(output: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    let ingest = &output.ingest;

    out.push_str("=== hosp - hospitalization reshape ===\n");
    out.push_str(&format!("Source: {}\n", output.source));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.row_errors.len()
    ));
    for err in ingest.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > MAX_LISTED_ROW_ERRORS {
        out.push_str(&format!(
            "  ... {} more\n",
            ingest.row_errors.len() - MAX_LISTED_ROW_ERRORS
        ));
    }

    let location = &config.reshape.location_code;
    let entity = ingest
        .records
        .iter()
        .find(|r| &r.location_code == location)
        .and_then(|r| r.entity.as_deref());
    match entity {
        Some(name) => out.push_str(&format!(
            "Location: {location} ({name}) | rows={}\n",
            output.filtered_rows
        )),
        None => out.push_str(&format!("Location: {location} | rows={}\n", output.filtered_rows)),
    }

    let wide = &output.wide;
    let range = wide
        .date_range()
        .map(|(a, b)| format!(" | dates=[{a}, {b}]"))
        .unwrap_or_default();
    out.push_str(&format!(
        "Table: {} rows x {} columns{range}\n",
        wide.n_rows(),
        wide.table().n_columns()
    ));

    let storage = match output.write {
        None => "disabled".to_string(),
        Some(WriteOutcome::Skipped) => format!("skipped ('{}' already exists)", config.table_name),
        Some(WriteOutcome::Written { rows, columns }) => format!(
            "wrote '{}' ({rows} rows, {columns} columns) to {}",
            config.table_name,
            config.store_dir.display()
        ),
    };
    out.push_str(&format!("Storage: {storage}\n"));

    out
}

/// Render the first `max_rows` rows of a table as aligned text.
///
/// Numeric columns are right-aligned, date columns left-aligned.
pub fn format_table_preview(table: &Table, max_rows: usize) -> String {
    if table.n_columns() == 0 {
        return "(empty table)\n".to_string();
    }

    let shown = table.n_rows().min(max_rows);
    let cells: Vec<Vec<String>> = table
        .columns()
        .iter()
        .map(|c| (0..shown).map(|row| c.data.cell_text(row).unwrap_or_default()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .zip(&cells)
        .map(|(c, values)| {
            values
                .iter()
                .map(|v| v.chars().count())
                .chain(std::iter::once(c.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.data.kind()).collect();

    let mut out = String::new();
    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(&widths)
        .zip(&kinds)
        .map(|((c, &w), &kind)| pad(&c.name, w, kind))
        .collect();
    push_line(&mut out, &header.join(" "));

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    push_line(&mut out, &rule.join(" "));

    for row in 0..shown {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .zip(&kinds)
            .map(|((values, &w), &kind)| pad(&values[row], w, kind))
            .collect();
        push_line(&mut out, &line.join(" "));
    }

    let hidden = table.n_rows() - shown;
    if hidden > 0 {
        out.push_str(&format!("... ({hidden} more rows)\n"));
    }
    if table.n_rows() == 0 {
        out.push_str("(no rows)\n");
    }

    out
}

fn pad(s: &str, width: usize, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::Float => format!("{s:>width$}"),
        ColumnKind::Date => format!("{s:<width$}"),
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use chrono::NaiveDate;
    use crate::domain::{Column, LongRecord, ObservedValue, ReshapeConfig, WideTable, WriteMode};
    use crate::io::ingest::{IngestedData, RowError};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    #[test]
    fn preview_aligns_and_truncates() {
        let table = Table::from_columns(vec![
            Column::float("cases", vec![5.0, 0.25, 12.0]),
            Column::date("date", vec![d(1), d(2), d(3)]),
        ])
        .unwrap();

        let txt = format_table_preview(&table, 2);
        let expected = concat!(
            "cases date\n",
            "----- ----------\n",
            "    5 2021-01-01\n",
            " 0.25 2021-01-02\n",
            "... (1 more rows)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn preview_of_empty_tables() {
        assert_eq!(format_table_preview(&Table::new(), 5), "(empty table)\n");

        let no_rows = Table::from_columns(vec![Column::date("date", Vec::new())]).unwrap();
        assert_eq!(format_table_preview(&no_rows, 5), "date\n----\n(no rows)\n");
    }

    #[test]
    fn summary_mentions_location_entity_and_storage() {
        let mut record = LongRecord::new("DZA", d(1), "cases", ObservedValue::Number(1.0));
        record.entity = Some("Algeria".to_string());

        let wide = WideTable::new(
            "date",
            vec![d(1)],
            Table::from_columns(vec![Column::float("cases", vec![1.0]), Column::date("date", vec![d(1)])])
                .unwrap(),
        )
        .unwrap();

        let output = RunOutput {
            source: "inline".to_string(),
            ingest: IngestedData {
                records: vec![record],
                row_errors: vec![RowError {
                    line: 3,
                    message: "Invalid date 'x'.".to_string(),
                }],
                rows_read: 2,
            },
            filtered_rows: 1,
            wide,
            write: Some(WriteOutcome::Written { rows: 1, columns: 2 }),
        };
        let config = RunConfig {
            source: "inline".to_string(),
            reshape: ReshapeConfig::default(),
            store_dir: PathBuf::from("tables"),
            table_name: "covid_stats".to_string(),
            write_mode: WriteMode::Overwrite,
            write: true,
            preview_rows: 5,
            plot: false,
            plot_width: 40,
            plot_height: 10,
        };

        let txt = format_run_summary(&output, &config);
        assert!(txt.contains("Rows: read=2 used=1 skipped=1\n"));
        assert!(txt.contains("  line 3: Invalid date 'x'.\n"));
        assert!(txt.contains("Location: DZA (Algeria) | rows=1\n"));
        assert!(txt.contains("Table: 1 rows x 2 columns | dates=[2021-01-01, 2021-01-01]\n"));
        assert!(txt.contains("Storage: wrote 'covid_stats' (1 rows, 2 columns) to tables\n"));
    }
}
