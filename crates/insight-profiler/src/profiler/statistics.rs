//! Statistical analysis functions for column profiling.

use std::collections::HashMap;

use crate::error::{ProfilingError, Result};
use crate::sanitize::finite;
use crate::table::{CellKey, Column};
use crate::types::{CategoryCount, Histogram, NumericalStats};

/// Numeric values of a column with their row positions.
///
/// Strings that read as numbers are coerced; everything else is skipped.
pub(crate) fn numeric_values(column: &Column) -> Vec<(usize, f64)> {
    column
        .non_null()
        .filter_map(|(row, cell)| cell.as_f64().map(|v| (row, v)))
        .collect()
}

/// Compute min/max/mean/median/std, extreme-value rows and a histogram.
pub(crate) fn compute_numerical_stats(column: &Column, bins: usize) -> Result<NumericalStats> {
    let indexed = numeric_values(column);
    if indexed.is_empty() {
        return Err(ProfilingError::NoNumericValues(column.name.clone()));
    }

    // First occurrence wins on ties
    let (mut min_row, mut min) = indexed[0];
    let (mut max_row, mut max) = indexed[0];
    for &(row, v) in &indexed[1..] {
        if v < min {
            min = v;
            min_row = row;
        }
        if v > max {
            max = v;
            max_row = row;
        }
    }

    let values: Vec<f64> = indexed.iter().map(|(_, v)| *v).collect();

    Ok(NumericalStats {
        min: finite(min),
        max: finite(max),
        mean: finite(calculate_mean(&values)),
        median: finite(calculate_median(&values)),
        std: calculate_std(&values).and_then(finite),
        min_row_index: Some(min_row),
        max_row_index: Some(max_row),
        histogram: calculate_histogram(&values, bins),
    })
}

pub(crate) fn calculate_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn calculate_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation, `None` with fewer than two values.
pub(crate) fn calculate_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = calculate_mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Equal-width histogram over `[min, max]` with the last bin closed.
///
/// A zero-width range is widened to `[min - 0.5, max + 0.5]`. Returns `None`
/// with fewer than two values or a non-finite range.
pub(crate) fn calculate_histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.len() < 2 || bins == 0 {
        return None;
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let bin_edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = if v >= hi {
            bins - 1
        } else {
            (((v - lo) / (hi - lo) * bins as f64) as usize).min(bins - 1)
        };
        counts[idx] += 1;
    }

    Some(Histogram { counts, bin_edges })
}

/// Distinct non-null values with their counts, in first-encounter order.
pub(crate) fn value_counts(column: &Column) -> Vec<(String, usize)> {
    let mut index: HashMap<CellKey, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for (_, cell) in column.non_null() {
        let Some(key) = cell.key() else { continue };
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((cell.to_string(), 1));
            }
        }
    }

    counts
}

/// Top categories by frequency, ties kept in first-encounter order.
pub(crate) fn top_categories(counts: &[(String, usize)], limit: usize) -> Vec<CategoryCount> {
    let mut sorted: Vec<&(String, usize)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
        .into_iter()
        .take(limit)
        .map(|(value, count)| CategoryCount {
            value: value.clone(),
            count: *count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn floats(values: &[f64]) -> Column {
        Column::new("x", values.iter().map(|v| Cell::Float(*v)).collect())
    }

    #[test]
    fn test_numerical_stats_basic() {
        let column = floats(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        let stats = compute_numerical_stats(&column, 10).unwrap();

        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.mean, Some(2.8));
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.min_row_index, Some(1));
        assert_eq!(stats.max_row_index, Some(4));
    }

    #[test]
    fn test_numerical_stats_skips_nulls_but_keeps_rows() {
        let column = Column::new(
            "x",
            vec![Cell::Null, Cell::Int(10), Cell::Null, Cell::Int(-2)],
        );
        let stats = compute_numerical_stats(&column, 10).unwrap();
        assert_eq!(stats.min_row_index, Some(3));
        assert_eq!(stats.max_row_index, Some(1));
    }

    #[test]
    fn test_numerical_stats_coerces_strings() {
        let column = Column::new(
            "price",
            vec![Cell::from("$1,200"), Cell::from("n/a"), Cell::Int(5)],
        );
        let stats = compute_numerical_stats(&column, 10).unwrap();
        assert_eq!(stats.max, Some(1200.0));
        assert_eq!(stats.max_row_index, Some(0));
    }

    #[test]
    fn test_numerical_stats_no_values() {
        let column = Column::new("x", vec![Cell::from("a"), Cell::Null]);
        let err = compute_numerical_stats(&column, 10).unwrap_err();
        assert!(matches!(err, ProfilingError::NoNumericValues(_)));
    }

    #[test]
    fn test_single_value_has_no_std_or_histogram() {
        let stats = compute_numerical_stats(&floats(&[7.0]), 10).unwrap();
        assert_eq!(stats.std, None);
        assert!(stats.histogram.is_none());
    }

    #[test]
    fn test_infinite_values_are_sanitized() {
        let stats = compute_numerical_stats(&floats(&[1.0, f64::INFINITY]), 10).unwrap();
        assert_eq!(stats.max, None);
        assert_eq!(stats.max_row_index, Some(1));
        assert!(stats.histogram.is_none());
    }

    #[test]
    fn test_calculate_std() {
        let std = calculate_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138).abs() < 0.001);
    }

    #[test]
    fn test_calculate_median_even() {
        assert_eq!(calculate_median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_histogram_last_bin_closed() {
        let h = calculate_histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.bin_edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = calculate_histogram(&[5.0, 5.0, 5.0], 10).unwrap();
        assert_eq!(h.bin_edges.first(), Some(&4.5));
        assert_eq!(h.bin_edges.last(), Some(&5.5));
        assert_eq!(h.counts.iter().sum::<usize>(), 3);
        assert_eq!(h.counts.len(), 10);
    }

    #[test]
    fn test_value_counts_and_categories() {
        let column = Column::new(
            "status",
            vec![
                Cell::from("b"),
                Cell::from("a"),
                Cell::from("a"),
                Cell::Null,
                Cell::from("c"),
                Cell::from("b"),
            ],
        );
        let counts = value_counts(&column);
        assert_eq!(counts.len(), 3);

        let top = top_categories(&counts, 2);
        assert_eq!(top[0].value, "b");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].value, "a");
        assert_eq!(top.len(), 2);
    }
}
