//! Input/output helpers.
//!
//! - long-format CSV ingest (`ingest`)
//! - plain CSV export of tables (`export`)
//! - table storage behind `StorageSink` / `StorageSource` (`store`)

pub mod export;
pub mod ingest;
pub mod store;

pub use export::*;
pub use ingest::*;
pub use store::*;
