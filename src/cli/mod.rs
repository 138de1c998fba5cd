//! Command-line parsing for the hospitalization reshape tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and storage code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{DuplicatePolicy, WriteMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "hosp",
    version,
    about = "Reshape long-format COVID-19 hospitalization data into a per-location wide table"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the source CSV, reshape one location, store and display the result.
    Run(RunArgs),
    /// Display a previously stored table.
    Show(ShowArgs),
}

/// Options for the full pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// CSV path or http(s) URL. Defaults to `HOSP_DATA_URL`, else the OWID file.
    #[arg(short, long)]
    pub source: Option<String>,

    /// Location (ISO code) to keep.
    #[arg(short, long, default_value = "DZA")]
    pub location: String,

    /// Value used for missing observations.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub fill: f64,

    /// Name of the column the date index is copied into.
    #[arg(long, default_value = "date")]
    pub index_column: String,

    /// How to resolve repeated (date, indicator) observations.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Mean)]
    pub duplicates: DuplicatePolicy,

    /// Directory of the table store.
    #[arg(long, default_value = "tables")]
    pub store_dir: PathBuf,

    /// Table name in the store.
    #[arg(short, long, default_value = "covid_stats")]
    pub table: String,

    /// Behavior when the table already exists.
    #[arg(long, value_enum, default_value_t = WriteMode::Overwrite)]
    pub mode: WriteMode,

    /// Do not write to the table store.
    #[arg(long)]
    pub no_write: bool,

    /// Also export the table to a plain CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Rows shown in the preview.
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for displaying a stored table.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Directory of the table store.
    #[arg(long, default_value = "tables")]
    pub store_dir: PathBuf,

    /// Table name in the store.
    #[arg(short, long, default_value = "covid_stats")]
    pub table: String,

    /// Rows shown in the preview.
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    /// Date column used as the plot's x axis.
    #[arg(long, default_value = "date")]
    pub x_column: String,

    /// Render an ASCII plot below the preview.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
