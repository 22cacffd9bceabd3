//! Table profiling.
//!
//! This module turns a [`Table`] into a [`TableProfile`]:
//! - Type inference and mixed-type detection per column
//! - Categorical summaries and missing-data accounting
//! - Numeric statistics, histograms and datetime detection
//! - Head and representative row samples
//! - A correlation matrix over numeric columns
//!
//! Each section is computed independently. A section that fails is left
//! out of the profile and recorded in [`TableProfile::skipped`].

mod correlation;
pub mod datetime;
mod sampling;
mod statistics;
mod type_inference;

use static_assertions::assert_impl_all;
use tracing::{debug, info, warn};

use crate::config::ProfilerConfig;
use crate::error::{ProfilingError, Result};
use crate::sanitize::{Sanitize, cell_to_json, row_to_json};
use crate::table::{Column, Table, blank_string_count};
use crate::types::{ColumnProfile, CorrelationMatrix, Row, SkippedSection, TableProfile};
use crate::utils::percent;

pub use datetime::{ParsedDatetime, parse_datetime};

use statistics::{compute_numerical_stats, top_categories, value_counts};
use type_inference::{
    KindTally, infer_column_type, is_categorical_candidate, is_numeric_column,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Stateless table profiler.
///
/// # Example
///
/// ```rust,ignore
/// use insight_profiler::{Table, TableProfiler};
///
/// let table = Table::from_records(&records)?;
/// let profile = TableProfiler::default().profile(&table);
/// println!("{}", serde_json::to_string_pretty(&profile)?);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableProfiler {
    config: ProfilerConfig,
}

assert_impl_all!(TableProfiler: Send, Sync);

impl TableProfiler {
    /// Create a profiler with a validated configuration.
    pub fn new(config: ProfilerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profile a whole table.
    ///
    /// Never fails: degenerate tables produce an empty profile and failed
    /// sections are listed in `skipped`.
    pub fn profile(&self, table: &Table) -> TableProfile {
        if table.width() == 0 {
            debug!("Profiling table with no columns");
            return TableProfile::empty();
        }

        let total_rows = table.height();
        let mut skipped = Vec::new();
        let mut columns = Vec::with_capacity(table.width());

        for column in table.columns() {
            let (profile, failures) = self.profile_column(column, total_rows);
            skipped.extend(failures);
            columns.push(profile);
        }

        let correlation_matrix = if self.config.compute_correlations {
            self.correlations(table, &columns)
        } else {
            None
        };

        let mut profile = TableProfile {
            total_rows,
            total_columns: table.width(),
            head: rows_at(table, &sampling::head_indices(total_rows, &self.config)),
            sample: rows_at(
                table,
                &sampling::representative_indices(total_rows, &self.config),
            ),
            columns,
            file_size_estimate_mb: table.estimated_size_bytes() as f64 / BYTES_PER_MB,
            correlation_matrix,
            skipped,
        };
        profile.sanitize();

        info!(
            "Profiled table: {} rows x {} columns ({} sections skipped)",
            profile.total_rows,
            profile.total_columns,
            profile.skipped.len()
        );
        profile
    }

    /// Profile one column, returning the sections that had to be skipped.
    fn profile_column(
        &self,
        column: &Column,
        total_rows: usize,
    ) -> (ColumnProfile, Vec<SkippedSection>) {
        let mut skipped = Vec::new();

        let tally = KindTally::from_column(column);
        let null_count = column.null_count();

        let datetime = if column.declared_type.is_numeric() || tally.non_null() == 0 {
            None
        } else {
            datetime::detect_datetime(column, self.config.datetime_threshold)
        };
        let inferred_type = infer_column_type(column, &tally, datetime.is_some());
        let has_mixed_types = tally.is_mixed();

        let counts = value_counts(column);
        let unique_count = counts.len();
        let is_categorical =
            is_categorical_candidate(column.declared_type, inferred_type, has_mixed_types)
                && unique_count <= self.config.categorical_threshold;
        let categories = if is_categorical {
            top_categories(&counts, self.config.category_limit)
        } else {
            Vec::new()
        };

        let numerical_stats = if is_numeric_column(
            column.declared_type,
            inferred_type,
            has_mixed_types,
        ) {
            match compute_numerical_stats(column, self.config.histogram_bins) {
                Ok(stats) => Some(stats),
                Err(e) => {
                    skipped.push(record_skip(column, "numerical_stats", e));
                    None
                }
            }
        } else {
            None
        };

        let sample_values = column
            .non_null()
            .take(self.config.sample_values_limit)
            .map(|(_, cell)| cell_to_json(cell))
            .collect();

        debug!(
            "Column '{}': declared {}, inferred {}, {} unique",
            column.name,
            column.declared_type,
            inferred_type.as_str(),
            unique_count
        );

        let (datetime_parts, date_pattern, date_range) = match datetime {
            Some(summary) => (Some(summary.parts), Some(summary.pattern), summary.range),
            None => (None, None, None),
        };

        let profile = ColumnProfile {
            name: column.name.clone(),
            declared_type: column.declared_type,
            inferred_type,
            null_count,
            null_percent: percent(null_count, total_rows),
            empty_string_count: blank_string_count(column),
            unique_count,
            sample_values,
            has_mixed_types,
            mixed_type_breakdown: if has_mixed_types {
                tally.breakdown()
            } else {
                Vec::new()
            },
            is_categorical,
            categories,
            datetime_parts,
            date_pattern,
            date_range,
            numerical_stats,
        };

        (profile, skipped)
    }

    /// Correlations between numeric columns.
    ///
    /// Columns without usable values stay in the matrix with 0 entries.
    fn correlations(
        &self,
        table: &Table,
        profiles: &[ColumnProfile],
    ) -> Option<CorrelationMatrix> {
        let numeric: Vec<(String, Vec<Option<f64>>)> = table
            .columns()
            .iter()
            .zip(profiles)
            .filter(|(_, p)| {
                is_numeric_column(p.declared_type, p.inferred_type, p.has_mixed_types)
            })
            .map(|(column, _)| {
                let values = column.values.iter().map(|c| c.as_f64()).collect();
                (column.name.clone(), values)
            })
            .collect();

        correlation::correlation_matrix(&numeric)
    }
}

/// Profile a table with the default configuration.
pub fn profile(table: &Table) -> TableProfile {
    TableProfiler::default().profile(table)
}

fn rows_at(table: &Table, indices: &[usize]) -> Vec<Row> {
    indices
        .iter()
        .filter_map(|&i| row_to_json(table, i))
        .collect()
}

fn record_skip(column: &Column, section: &str, error: ProfilingError) -> SkippedSection {
    warn!(
        "Skipping {} for column '{}': {}",
        section, column.name, error
    );
    SkippedSection {
        column: Some(column.name.clone()),
        section: section.to_string(),
        reason: error.to_string(),
    }
}
