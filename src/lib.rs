//! `hosp-reshape` library crate.
//!
//! The binary (`hosp`) is a thin wrapper around this library so that:
//!
//! - the reshape stages are testable without spawning processes
//! - storage and sources sit behind traits and can be swapped by callers

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod reshape;
