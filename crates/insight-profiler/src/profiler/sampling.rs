//! Head and representative row sampling.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::ProfilerConfig;

/// Row positions of the head sample: `min(floor(rows * fraction) + 1, cap)`.
pub(crate) fn head_indices(rows: usize, config: &ProfilerConfig) -> Vec<usize> {
    if rows == 0 {
        return Vec::new();
    }
    let size = (fraction_of(rows, config.sample_fraction) + 1)
        .min(config.head_sample_max_rows)
        .min(rows);
    (0..size).collect()
}

/// Row positions of the seeded representative sample, ascending.
///
/// Small tables are returned whole; larger ones draw
/// `min(floor(rows * fraction), max_sample_rows)` rows.
pub(crate) fn representative_indices(rows: usize, config: &ProfilerConfig) -> Vec<usize> {
    if rows <= config.full_sample_max_rows {
        return (0..rows).collect();
    }

    let size = fraction_of(rows, config.sample_fraction).min(config.max_sample_rows);
    if size == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(config.sample_seed);
    let all: Vec<usize> = (0..rows).collect();
    let mut picked: Vec<usize> = all.choose_multiple(&mut rng, size).copied().collect();
    picked.sort_unstable();
    picked
}

fn fraction_of(rows: usize, fraction: f64) -> usize {
    (rows as f64 * fraction).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_sizes() {
        let config = ProfilerConfig::default();
        assert!(head_indices(0, &config).is_empty());
        assert_eq!(head_indices(1, &config), vec![0]);
        assert_eq!(head_indices(19, &config).len(), 1);
        assert_eq!(head_indices(40, &config).len(), 3);
        assert_eq!(head_indices(10_000, &config).len(), 5);
    }

    #[test]
    fn test_small_tables_sampled_whole() {
        let config = ProfilerConfig::default();
        assert_eq!(representative_indices(10, &config), (0..10).collect::<Vec<_>>());
        assert!(representative_indices(0, &config).is_empty());
    }

    #[test]
    fn test_sample_size_bounds() {
        let config = ProfilerConfig::default();
        // floor(5% of 15) == 0
        assert!(representative_indices(15, &config).is_empty());
        assert_eq!(representative_indices(100, &config).len(), 5);
        assert_eq!(representative_indices(100_000, &config).len(), 50);
    }

    #[test]
    fn test_sample_is_deterministic_and_sorted() {
        let config = ProfilerConfig::default();
        let first = representative_indices(500, &config);
        let second = representative_indices(500, &config);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|&i| i < 500));
    }

    #[test]
    fn test_seed_changes_sample() {
        let a = representative_indices(1000, &ProfilerConfig::default());
        let config = ProfilerConfig::builder().sample_seed(7).build().unwrap();
        let b = representative_indices(1000, &config);
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }
}
