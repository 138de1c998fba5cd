//! Shared reshape workflow used by the `run` command.
//!
//! source → ingest → reshape → storage
//!
//! Presentation (summary, preview, plot) stays in `app`.

use tracing::info;

use crate::data::CsvSource;
use crate::domain::{ReshapeConfig, RunConfig, WideTable};
use crate::error::AppError;
use crate::io::ingest::{IngestedData, read_long_records};
use crate::io::store::{StorageSink, WriteOutcome};
use crate::reshape::reshape;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub source: String,
    pub ingest: IngestedData,
    /// Rows left after filtering by location.
    pub filtered_rows: usize,
    pub wide: WideTable,
    /// `None` when writing was disabled.
    pub write: Option<WriteOutcome>,
}

/// Execute the full pipeline: read, reshape and (optionally) store.
pub fn run_reshape(
    config: &RunConfig,
    source: &dyn CsvSource,
    sink: &mut dyn StorageSink,
) -> Result<RunOutput, AppError> {
    let description = source.describe();
    info!(source = %description, "reading long-format CSV");
    let ingest = read_long_records(source.open()?)?;
    info!(
        rows_read = ingest.rows_read,
        rows_used = ingest.rows_used(),
        "ingest complete"
    );

    let (filtered_rows, wide) = reshape_ingested(&ingest, &config.reshape)?;

    let write = if config.write {
        Some(sink.write(wide.table(), &config.table_name, config.write_mode)?)
    } else {
        None
    };

    Ok(RunOutput {
        source: description,
        ingest,
        filtered_rows,
        wide,
        write,
    })
}

/// Reshape already-ingested records; returns the filtered row count and the table.
pub fn reshape_ingested(
    ingest: &IngestedData,
    config: &ReshapeConfig,
) -> Result<(usize, WideTable), AppError> {
    let filtered_rows = ingest
        .records
        .iter()
        .filter(|r| r.location_code == config.location_code)
        .count();
    let wide = reshape(&ingest.records, config)?;
    info!(
        location = %config.location_code,
        rows = wide.n_rows(),
        columns = wide.table().n_columns(),
        "reshape complete"
    );
    Ok((filtered_rows, wide))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::path::PathBuf;
    use crate::domain::WriteMode;
    use crate::io::store::{MemoryStore, StorageSource};

    struct StrSource(&'static str);

    impl CsvSource for StrSource {
        fn describe(&self) -> String {
            "inline".to_string()
        }

        fn open(&self) -> Result<Box<dyn Read>, AppError> {
            Ok(Box::new(Cursor::new(self.0)))
        }
    }

    const CSV: &str = "entity,iso_code,date,indicator,value\n\
        Algeria,DZA,2021-01-01,Daily ICU occupancy,5\n\
        Algeria,DZA,2021-01-01,Daily hospital occupancy,\n\
        Algeria,DZA,2021-01-02,Daily ICU occupancy,6\n\
        France,FRA,2021-01-01,Daily ICU occupancy,100\n";

    fn config() -> RunConfig {
        RunConfig {
            source: "inline".to_string(),
            reshape: ReshapeConfig::default(),
            store_dir: PathBuf::from("unused"),
            table_name: "covid_stats".to_string(),
            write_mode: WriteMode::Overwrite,
            write: true,
            preview_rows: 10,
            plot: false,
            plot_width: 60,
            plot_height: 10,
        }
    }

    #[test]
    fn run_writes_wide_table_with_date_column() {
        let mut store = MemoryStore::new();
        let out = run_reshape(&config(), &StrSource(CSV), &mut store).unwrap();

        assert_eq!(out.ingest.rows_read, 4);
        assert_eq!(out.filtered_rows, 3);
        assert_eq!(out.wide.n_rows(), 2);
        assert_eq!(out.write, Some(WriteOutcome::Written { rows: 2, columns: 3 }));

        let stored = store.read("covid_stats").unwrap();
        assert_eq!(
            stored.column_names(),
            vec!["Daily_ICU_occupancy", "Daily_hospital_occupancy", "date"]
        );
        assert_eq!(
            stored.column("Daily_hospital_occupancy").unwrap().as_floats().unwrap(),
            &[0.0, 0.0]
        );
        assert_eq!(stored.column("date").unwrap().as_dates().unwrap(), out.wide.index());
    }

    #[test]
    fn write_can_be_disabled() {
        let mut store = MemoryStore::new();
        let cfg = RunConfig { write: false, ..config() };
        let out = run_reshape(&cfg, &StrSource(CSV), &mut store).unwrap();
        assert_eq!(out.write, None);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_location_still_writes_empty_table() {
        let mut store = MemoryStore::new();
        let mut cfg = config();
        cfg.reshape.location_code = "ZZZ".to_string();

        let out = run_reshape(&cfg, &StrSource(CSV), &mut store).unwrap();
        assert_eq!(out.filtered_rows, 0);
        assert_eq!(out.write, Some(WriteOutcome::Written { rows: 0, columns: 1 }));
    }

    #[test]
    fn reshape_ingested_counts_location_rows() {
        let ingest = read_long_records(CSV.as_bytes()).unwrap();
        let (filtered_rows, wide) = reshape_ingested(&ingest, &ReshapeConfig::default()).unwrap();

        assert_eq!(filtered_rows, 3);
        assert_eq!(
            wide,
            crate::reshape::reshape(&ingest.records, &ReshapeConfig::default()).unwrap()
        );
        assert_eq!(
            wide.column("Daily_ICU_occupancy").unwrap().as_floats().unwrap(),
            &[5.0, 6.0]
        );
    }

    #[test]
    fn conversion_error_aborts_before_write() {
        let mut store = MemoryStore::new();
        let source = StrSource("iso_code,date,indicator,value\nDZA,2021-01-01,cases,five\n");

        let err = run_reshape(&config(), &source, &mut store).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(store.is_empty());
    }
}
