//! ASCII time-series plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a line with its own glyph; the legend sits at the
//! top-left, above the grid. Later series draw over earlier ones.

use chrono::NaiveDate;

use crate::domain::{Table, WideTable};
use crate::error::AppError;

const GLYPHS: [char; 8] = ['*', '+', 'o', 'x', '#', '@', '%', '&'];

/// One named line on the chart.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Plot every numeric column of a wide table against its date index.
pub fn render_wide_plot(wide: &WideTable, width: usize, height: usize) -> String {
    let series = float_series(wide.table());
    render_series_plot(wide.index(), &series, width, height)
}

/// Plot every numeric column of a stored table against one of its date columns.
pub fn render_table_plot(table: &Table, x_column: &str, width: usize, height: usize) -> Result<String, AppError> {
    let dates = table
        .column(x_column)
        .ok_or_else(|| AppError::new(2, format!("Column '{x_column}' not found.")))?
        .as_dates()
        .ok_or_else(|| AppError::new(2, format!("Column '{x_column}' is not a date column.")))?;
    let series = float_series(table);
    Ok(render_series_plot(dates, &series, width, height))
}

fn float_series(table: &Table) -> Vec<Series<'_>> {
    table
        .columns()
        .iter()
        .filter_map(|c| c.as_floats().map(|values| Series { name: &c.name, values }))
        .collect()
}

/// Render series sharing a date axis.
pub fn render_series_plot(dates: &[NaiveDate], series: &[Series<'_>], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    if dates.is_empty() || series.is_empty() {
        return "Plot: (no data)\n".to_string();
    }

    let xs: Vec<f64> = dates.iter().map(|d| days_since(dates[0], *d)).collect();
    let (x_min, x_max) = x_range(&xs);
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (i, s) in series.iter().enumerate() {
        let glyph = GLYPHS[i % GLYPHS.len()];
        let mut prev = None;
        for (&x, &y) in xs.iter().zip(s.values) {
            if !y.is_finite() {
                prev = None;
                continue;
            }
            let cx = map_x(x, x_min, x_max, width);
            let cy = map_y(y, y_min, y_max, height);
            match prev {
                Some((px, py)) => draw_line(&mut grid, px, py, cx, cy, glyph),
                None => grid[cy][cx] = glyph,
            }
            prev = Some((cx, cy));
        }
    }

    let first = dates.iter().min().copied().unwrap_or(dates[0]);
    let last = dates.iter().max().copied().unwrap_or(dates[0]);

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: date=[{first}, {last}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for (i, s) in series.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", GLYPHS[i % GLYPHS.len()], s.name));
    }
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn days_since(origin: NaiveDate, d: NaiveDate) -> f64 {
    (d - origin).num_days() as f64
}

fn x_range(xs: &[f64]) -> (f64, f64) {
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > min { (min, max) } else { (min - 1.0, min + 1.0) }
}

fn y_range(series: &[Series<'_>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for s in series {
        for &y in s.values.iter().filter(|y| y.is_finite()) {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat data: center it.
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
