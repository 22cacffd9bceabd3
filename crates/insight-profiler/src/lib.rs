//! Tabular Data Profiling Library
//!
//! Turns an arbitrary, possibly messy table into a structured metadata
//! profile that an analytics chat backend can hand to a language model or a
//! UI as strict JSON.
//!
//! # Overview
//!
//! - **Type Inference**: declared storage, lenient datetime detection and
//!   per-cell runtime kinds, with mixed-type breakdowns
//! - **Summaries**: categorical values, missing data, numeric statistics
//!   with extreme-value row pointers, histograms and correlations
//! - **Sampling**: head rows and a seeded representative sample
//! - **Orders**: flattening raw Salla orders into a table
//! - **Projects**: cached table lookup, multi-dataset analysis and
//!   persistence behind injectable traits
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use insight_profiler::{ProfilerConfig, Table, TableProfiler, load_csv};
//!
//! let table = load_csv("orders.csv")?;
//!
//! let config = ProfilerConfig::builder()
//!     .sample_seed(42)
//!     .histogram_bins(10)
//!     .build()?;
//!
//! let profile = TableProfiler::new(config)?.profile(&table);
//! println!("{}", serde_json::to_string_pretty(&profile)?);
//! ```
//!
//! # Project Analysis
//!
//! ```rust,ignore
//! use insight_profiler::project::*;
//! use insight_profiler::TableProfiler;
//!
//! let analyzer = ProjectAnalyzer::new(
//!     TableProfiler::default(),
//!     InMemoryTableStore::new(),
//!     JsonFileProfileSink::new("./profiles")?,
//! );
//!
//! let upload = NamedTable::new("CSV", table);
//! let outcome = analyzer.analyze_and_store(ProjectId(7), Some(upload))?;
//! assert!(outcome.stored);
//! ```
//!
//! # JSON Safety
//!
//! Profiles never contain NaN or infinity. Non-finite statistics become
//! `null` and undefined correlations become `0`; see [`sanitize`].

pub mod config;
pub mod error;
pub mod orders;
pub mod profiler;
pub mod project;
pub mod sanitize;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, ProfilerConfig, ProfilerConfigBuilder};
pub use error::{ProfilingError, Result as ProfilingResult, ResultExt};
pub use orders::{normalize_orders, orders_to_table};
pub use profiler::{ParsedDatetime, TableProfiler, parse_datetime, profile};
pub use project::{
    CachedTableStore, InMemoryProfileSink, InMemoryTableStore, JsonFileProfileSink, NamedTable,
    ProfileSink, ProjectAnalysis, ProjectAnalyzer, ProjectId, StoredAnalysis, TableStore,
};
pub use sanitize::{Sanitize, cell_to_json, to_json_value};
pub use table::{Cell, CellKind, Column, DeclaredType, Table, classify, load_csv};
pub use types::{
    CategoryCount, ColumnProfile, CorrelationMatrix, DatasetProfile, DatePattern, DateRange,
    DatetimeParts, Histogram, InferredType, NumericalStats, Row, SkippedSection, TableProfile,
    TypeCount,
};
