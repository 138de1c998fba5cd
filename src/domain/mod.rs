//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - long observations (`LongRecord`, `ObservedValue`)
//! - typed tables (`Table`, `Column`, `ColumnData`, `WideTable`)
//! - configuration (`ReshapeConfig`, `DuplicatePolicy`, `WriteMode`, `RunConfig`)

pub mod types;

pub use types::*;
