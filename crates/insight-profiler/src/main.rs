//! CLI entry point for the table profiler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use insight_profiler::{
    InMemoryProfileSink, InMemoryTableStore, JsonFileProfileSink, NamedTable, ProfilerConfig,
    ProjectAnalysis, ProjectAnalyzer, ProjectId, Table, TableProfile, TableProfiler, load_csv,
    orders_to_table, to_json_value,
};
use serde_json::Value;
use tracing::{debug, info};

/// Input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// A JSON array of flat records
    Json,
    /// Raw Salla orders (an array or an API response with a `data` field)
    Salla,
}

impl InputFormat {
    /// Guess the format from the file extension.
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Csv,
        }
    }

    fn source_label(self) -> &'static str {
        match self {
            InputFormat::Csv => "CSV",
            InputFormat::Json => "JSON",
            InputFormat::Salla => insight_profiler::project::STORED_SOURCE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular data profiler",
    long_about = "Profiles a tabular dataset and prints its metadata profile.\n\n\
                  EXAMPLES:\n  \
                  # Human-readable column overview\n  \
                  insight-profiler -i orders.csv\n\n  \
                  # Full JSON profile\n  \
                  insight-profiler -i orders.csv --json\n\n  \
                  # Profile raw Salla orders and save under project 7\n  \
                  insight-profiler -i orders.json --format salla --project-id 7 --store ./profiles"
)]
struct Args {
    /// Path to the file to profile
    #[arg(short, long)]
    input: PathBuf,

    /// Input format (defaults to the file extension)
    #[arg(short, long, value_enum)]
    format: Option<InputFormat>,

    /// Output the JSON profile instead of a human-readable summary
    #[arg(long)]
    json: bool,

    /// Seed for the representative sample
    #[arg(long)]
    seed: Option<u64>,

    /// Project to file the analysis under
    #[arg(long)]
    project_id: Option<i64>,

    /// Directory to persist the project analysis in
    #[arg(long, requires = "project_id")]
    store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so that stdout only
/// carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let format = args
        .format
        .unwrap_or_else(|| InputFormat::from_path(&args.input));
    info!("Loading {:?} data from: {}", format, args.input.display());
    let table = load_table(&args.input, format)?;
    info!("Loaded table: {} rows x {} columns", table.height(), table.width());

    let mut config = ProfilerConfig::default();
    if let Some(seed) = args.seed {
        config.sample_seed = seed;
    }
    let profiler = TableProfiler::new(config)?;

    match (args.project_id, &args.store) {
        (Some(id), Some(dir)) => run_project(&args, profiler, ProjectId(id), dir, format, table),
        (Some(id), None) => {
            let analyzer = ProjectAnalyzer::new(
                profiler,
                InMemoryTableStore::new(),
                InMemoryProfileSink::new(),
            );
            let analysis = analyzer.analyze(
                ProjectId(id),
                Some(NamedTable::new(format.source_label(), table)),
            );
            print_analysis(&args, &analysis)
        }
        _ => {
            let profile = profiler.profile(&table);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&to_json_value(&profile))?);
            } else {
                print_profile_summary(&args.input.display().to_string(), &profile);
            }
            Ok(())
        }
    }
}

/// Profile into a directory-backed store.
///
/// Salla orders go through the store as the project's stored table; other
/// inputs are analyzed as an upload.
fn run_project(
    args: &Args,
    profiler: TableProfiler,
    project_id: ProjectId,
    dir: &Path,
    format: InputFormat,
    table: Table,
) -> Result<()> {
    let store = InMemoryTableStore::new();
    let upload = if format == InputFormat::Salla {
        store.insert(project_id, table);
        None
    } else {
        Some(NamedTable::new(format.source_label(), table))
    };

    let sink = JsonFileProfileSink::new(dir)?;
    let analyzer = ProjectAnalyzer::new(profiler, store, sink);
    let outcome = analyzer.analyze_and_store(project_id, upload)?;

    if outcome.stored {
        info!(
            "Saved analysis to {}",
            analyzer.sink().path_for(project_id).display()
        );
    } else {
        bail!("Nothing to analyze in {}", args.input.display());
    }

    print_analysis(args, &outcome.analysis)
}

fn load_table(path: &Path, format: InputFormat) -> Result<Table> {
    match format {
        InputFormat::Csv => {
            load_csv(path).with_context(|| format!("Failed to load CSV {}", path.display()))
        }
        InputFormat::Json => {
            let records = read_records(path)?;
            Ok(Table::from_records(&records)?)
        }
        InputFormat::Salla => {
            let orders = read_records(path)?;
            debug!("Normalizing {} Salla orders", orders.len());
            Ok(orders_to_table(&orders)?)
        }
    }
}

/// Read a JSON array, or the `data` array of an API response.
fn read_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("Expected a JSON array or an object with a 'data' array"),
        },
        _ => bail!("Expected a JSON array or an object with a 'data' array"),
    }
}

fn print_analysis(args: &Args, analysis: &ProjectAnalysis) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json_value(analysis))?);
        return Ok(());
    }

    println!("Project {}: {} dataset(s)", analysis.project_id, analysis.dataframes.len());
    for dataset in &analysis.dataframes {
        print_profile_summary(&dataset.source, &dataset.profile);
    }
    Ok(())
}

/// Print a human-readable overview of a profile.
///
/// Note: This function uses `println!` intentionally for user-facing CLI
/// output, independent of the log level.
fn print_profile_summary(source: &str, profile: &TableProfile) {
    println!("\n{}", "=".repeat(80));
    println!("PROFILE: {}", source);
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Rows: {}", profile.total_rows);
    println!("  Columns: {}", profile.total_columns);
    println!("  Estimated size: {:.3} MB", profile.file_size_estimate_mb);
    println!();

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<10} {:<10} {:<10} {:<8} {:<12}",
        "Column", "Declared", "Inferred", "Missing %", "Unique", "Categorical"
    );
    println!("{}", "-".repeat(75));

    for col in &profile.columns {
        println!(
            "{:<20} {:<10} {:<10} {:<10.1} {:<8} {:<12}",
            truncate_str(&col.name, 19),
            col.declared_type.as_str(),
            col.inferred_type.as_str(),
            col.null_percent,
            col.unique_count,
            if col.is_categorical { "yes" } else { "" }
        );
    }
    println!();

    let mixed: Vec<&str> = profile
        .columns
        .iter()
        .filter(|c| c.has_mixed_types)
        .map(|c| c.name.as_str())
        .collect();
    if !mixed.is_empty() {
        println!("  Mixed-type columns: {}", mixed.join(", "));
    }

    if let Some(matrix) = &profile.correlation_matrix {
        println!("  Correlated numeric columns: {}", matrix.columns.join(", "));
    }

    for skipped in &profile.skipped {
        println!(
            "  Skipped {} for {}: {}",
            skipped.section,
            skipped.column.as_deref().unwrap_or("table"),
            skipped.reason
        );
    }
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
