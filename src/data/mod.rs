//! Data acquisition.

pub mod source;

pub use source::{CsvSource, DEFAULT_DATA_URL, FileSource, HttpSource, default_source, source_for};
