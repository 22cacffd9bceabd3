//! Pairwise Pearson correlation between numeric columns.

use crate::types::CorrelationMatrix;
use crate::utils::round_to;

/// Pearson correlation over rows where both values are present.
///
/// `None` with fewer than two paired rows or zero variance.
pub(crate) fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Correlation matrix of the given columns, rounded to three decimals.
///
/// Undefined coefficients are reported as 0. Returns `None` for fewer than
/// two columns.
pub(crate) fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> Option<CorrelationMatrix> {
    if columns.len() < 2 {
        return None;
    }

    let n = columns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i].1, &columns[j].1)
                .map(|r| round_to(r, 3))
                .unwrap_or(0.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Some(CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_pearson_perfect() {
        let r = pearson(&some(&[1.0, 2.0, 3.0]), &some(&[2.0, 4.0, 6.0])).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&some(&[1.0, 2.0, 3.0]), &some(&[3.0, 2.0, 1.0])).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_is_undefined() {
        assert!(pearson(&some(&[1.0, 1.0, 1.0]), &some(&[1.0, 2.0, 3.0])).is_none());
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        let y = vec![Some(1.0), Some(100.0), Some(2.0), Some(3.0)];
        let r = pearson(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_constant_column_is_zero() {
        let columns = vec![
            ("a".to_string(), some(&[1.0, 2.0, 3.0, 4.0])),
            ("b".to_string(), some(&[5.0, 5.0, 5.0, 5.0])),
        ];
        let matrix = correlation_matrix(&columns).unwrap();
        assert_eq!(matrix.columns, vec!["a", "b"]);
        assert_eq!(matrix.values, vec![vec![1.0, 0.0], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_matrix_needs_two_columns() {
        let columns = vec![("a".to_string(), some(&[1.0, 2.0]))];
        assert!(correlation_matrix(&columns).is_none());
    }

    #[test]
    fn test_matrix_rounds() {
        let columns = vec![
            ("a".to_string(), some(&[1.0, 2.0, 3.0, 4.0])),
            ("b".to_string(), some(&[1.0, 3.0, 2.0, 4.0])),
        ];
        let matrix = correlation_matrix(&columns).unwrap();
        assert_eq!(matrix.values[0][1], 0.8);
    }
}
