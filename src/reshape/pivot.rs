//! Numeric coercion and the long → wide pivot.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;

use crate::domain::{Column, DuplicatePolicy, LongRecord, ObservedValue, WideTable};
use crate::error::ReshapeError;

/// Coerce an observed value to a number.
///
/// `Ok(None)` means missing (empty cell, NA token, or a parsed NaN).
pub fn coerce_value(record: &LongRecord) -> Result<Option<f64>, ReshapeError> {
    match &record.value {
        ObservedValue::Missing => Ok(None),
        ObservedValue::Number(v) => Ok(if v.is_nan() { None } else { Some(*v) }),
        ObservedValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_nan() => Ok(None),
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(ReshapeError::Conversion {
                    date: record.date,
                    indicator: record.indicator.clone(),
                    value: s.clone(),
                }),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    sum: f64,
    count: u32,
}

/// Coerce, fill and pivot `rows` into a date-indexed wide table.
///
/// Rows are sorted by date and columns by indicator name. Cells with no
/// observation for their (date, indicator) pair receive `fill_value`.
pub fn coerce_and_pivot(
    rows: &[LongRecord],
    fill_value: f64,
    policy: DuplicatePolicy,
    index_name: &str,
) -> Result<WideTable, ReshapeError> {
    let mut cells: BTreeMap<(NaiveDate, &str), Cell> = BTreeMap::new();
    let mut dates: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut indicators: BTreeMap<&str, usize> = BTreeMap::new();

    for record in rows {
        let value = coerce_value(record)?.unwrap_or(fill_value);
        dates.insert(record.date, 0);
        indicators.insert(record.indicator.as_str(), 0);

        match cells.entry((record.date, record.indicator.as_str())) {
            Entry::Vacant(slot) => {
                slot.insert(Cell { sum: value, count: 1 });
            }
            Entry::Occupied(mut slot) => {
                let cell = slot.get_mut();
                match policy {
                    DuplicatePolicy::Mean => {
                        cell.sum += value;
                        cell.count += 1;
                    }
                    DuplicatePolicy::Last => {
                        *cell = Cell { sum: value, count: 1 };
                    }
                    DuplicatePolicy::Error => {
                        return Err(ReshapeError::DuplicateObservation {
                            date: record.date,
                            indicator: record.indicator.clone(),
                        });
                    }
                }
            }
        }
    }

    for (i, slot) in dates.values_mut().enumerate() {
        *slot = i;
    }
    for (i, slot) in indicators.values_mut().enumerate() {
        *slot = i;
    }

    let n_rows = dates.len();
    let mut grid = vec![vec![fill_value; n_rows]; indicators.len()];
    for ((date, indicator), cell) in &cells {
        let row = dates[date];
        let col = indicators[indicator];
        grid[col][row] = cell.sum / f64::from(cell.count);
    }

    let columns: Vec<Column> = indicators
        .keys()
        .zip(grid)
        .map(|(name, values)| Column::float(*name, values))
        .collect();
    let index: Vec<NaiveDate> = dates.into_keys().collect();

    Ok(WideTable::from_parts(index_name, index, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn rec(day: u32, indicator: &str, value: ObservedValue) -> LongRecord {
        LongRecord::new("DZA", d(day), indicator, value)
    }

    #[test]
    fn coerce_trims_and_treats_nan_as_missing() {
        assert_eq!(coerce_value(&rec(1, "a", ObservedValue::text(" 4.5 "))).unwrap(), Some(4.5));
        assert_eq!(coerce_value(&rec(1, "a", ObservedValue::text("NaN"))).unwrap(), None);
        assert_eq!(coerce_value(&rec(1, "a", ObservedValue::Number(f64::NAN))).unwrap(), None);
        assert_eq!(coerce_value(&rec(1, "a", ObservedValue::Missing)).unwrap(), None);
    }

    #[test]
    fn coerce_rejects_text() {
        let err = coerce_value(&rec(3, "cases", ObservedValue::text("lots"))).unwrap_err();
        assert_eq!(
            err,
            ReshapeError::Conversion {
                date: d(3),
                indicator: "cases".to_string(),
                value: "lots".to_string(),
            }
        );
    }

    #[test]
    fn pivot_sorts_and_fills_unobserved_cells() {
        let rows = vec![
            rec(2, "icu", ObservedValue::Number(3.0)),
            rec(1, "beds", ObservedValue::Number(10.0)),
            rec(2, "beds", ObservedValue::Number(11.0)),
        ];
        let wide = coerce_and_pivot(&rows, -1.0, DuplicatePolicy::Mean, "date").unwrap();

        assert_eq!(wide.index(), &[d(1), d(2)]);
        assert_eq!(wide.column_names(), vec!["beds", "icu"]);
        assert_eq!(wide.column("beds").unwrap().as_floats().unwrap(), &[10.0, 11.0]);
        assert_eq!(wide.column("icu").unwrap().as_floats().unwrap(), &[-1.0, 3.0]);
    }

    #[test]
    fn duplicates_follow_policy() {
        let rows = vec![
            rec(1, "beds", ObservedValue::Number(2.0)),
            rec(1, "beds", ObservedValue::Number(4.0)),
        ];

        let mean = coerce_and_pivot(&rows, 0.0, DuplicatePolicy::Mean, "date").unwrap();
        assert_eq!(mean.column("beds").unwrap().as_floats().unwrap(), &[3.0]);

        let last = coerce_and_pivot(&rows, 0.0, DuplicatePolicy::Last, "date").unwrap();
        assert_eq!(last.column("beds").unwrap().as_floats().unwrap(), &[4.0]);

        let err = coerce_and_pivot(&rows, 0.0, DuplicatePolicy::Error, "date").unwrap_err();
        assert!(matches!(err, ReshapeError::DuplicateObservation { .. }));
    }

    #[test]
    fn missing_values_are_filled_before_averaging() {
        let rows = vec![
            rec(1, "beds", ObservedValue::Number(4.0)),
            rec(1, "beds", ObservedValue::Missing),
        ];
        let wide = coerce_and_pivot(&rows, 0.0, DuplicatePolicy::Mean, "date").unwrap();
        assert_eq!(wide.column("beds").unwrap().as_floats().unwrap(), &[2.0]);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let wide = coerce_and_pivot(&[], 0.0, DuplicatePolicy::Mean, "date").unwrap();
        assert_eq!(wide.n_rows(), 0);
        assert_eq!(wide.table().n_columns(), 0);
    }
}
