//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - picks the CSV source and the table store
//! - runs the reshape pipeline
//! - prints the summary, preview and plot

use clap::Parser;
use tracing::info;

use crate::cli::{Command, RunArgs, ShowArgs};
use crate::data::{default_source, source_for};
use crate::domain::{ReshapeConfig, RunConfig};
use crate::error::AppError;
use crate::io::store::{CsvTableStore, StorageSource};

pub mod pipeline;

/// Entry point for the `hosp` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let source = source_for(&config.source);
    let mut store = CsvTableStore::new(&config.store_dir);

    let run = pipeline::run_reshape(&config, source.as_ref(), &mut store)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    println!(
        "{}",
        crate::report::format_table_preview(run.wide.table(), config.preview_rows)
    );

    if config.plot {
        println!(
            "{}",
            crate::plot::render_wide_plot(&run.wide, config.plot_width, config.plot_height)
        );
    }

    if let Some(path) = &args.export {
        crate::io::export::write_table_csv_file(path, run.wide.table())?;
        info!(path = %path.display(), "exported table");
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let store = CsvTableStore::new(&args.store_dir);
    let table = store.read(&args.table)?;

    println!(
        "Table '{}': {} rows x {} columns\n",
        args.table,
        table.n_rows(),
        table.n_columns()
    );
    println!("{}", crate::report::format_table_preview(&table, args.rows));

    if args.plot {
        let plot = crate::plot::render_table_plot(&table, &args.x_column, args.width, args.height)?;
        println!("{plot}");
    }
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        source: args.source.clone().unwrap_or_else(default_source),
        reshape: ReshapeConfig {
            location_code: args.location.clone(),
            fill_value: args.fill,
            index_column: args.index_column.clone(),
            duplicate_policy: args.duplicates,
        },
        store_dir: args.store_dir.clone(),
        table_name: args.table.clone(),
        write_mode: args.mode,
        write: !args.no_write,
        preview_rows: args.rows,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
    }
}

/// Rewrite argv so `hosp` defaults to `hosp run`.
///
/// Rules:
/// - `hosp`                      -> `hosp run`
/// - `hosp -l USA ...`           -> `hosp run -l USA ...`
/// - `hosp --help/--version/-h`  -> unchanged (show top-level help/version)
/// - `hosp -v show ...`          -> unchanged (leading `-v` flags are global)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let first = argv
        .iter()
        .skip(1)
        .position(|a| !is_verbose_flag(a))
        .map(|i| i + 1);
    let Some(pos) = first else {
        argv.push("run".to_string());
        return argv;
    };
    let arg1 = argv[pos].clone();

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "show");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(pos, "run".to_string());
        return argv;
    }

    argv
}

/// `-v`, `-vv`, ... or `--verbose`.
fn is_verbose_flag(arg: &str) -> bool {
    arg == "--verbose"
        || arg
            .strip_prefix('-')
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c == 'v'))
}
