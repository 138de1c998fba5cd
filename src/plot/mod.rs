//! Terminal plotting.

pub mod ascii;

pub use ascii::{Series, render_series_plot, render_table_plot, render_wide_plot};
