//! Reporting: run summary and table previews.

pub mod format;

pub use format::{format_run_summary, format_table_preview};
