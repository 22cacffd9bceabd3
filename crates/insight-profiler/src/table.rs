//! In-memory tabular model consumed by the profiler.
//!
//! A [`Table`] is an ordered list of named [`Column`]s holding tagged
//! [`Cell`] values. The tag is what the profiler inspects for mixed-type
//! detection, so a column whose storage is nominally `object` still exposes
//! the real kind of each value.
//!
//! Tables are built from a polars [`DataFrame`], from JSON records, or from
//! a CSV file read through polars.

use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::{AnyValue, CsvParseOptions, DataFrame, SerReader, TimeUnit};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ProfilingError, Result, ResultExt};
use crate::utils::declared_type_for;

// =============================================================================
// Cells
// =============================================================================

/// A single table value with its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// The runtime type of a [`Cell`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Null,
    Int,
    Float,
    Str,
    Bool,
    DateTime,
}

impl CellKind {
    /// Name reported in mixed-type breakdowns.
    pub fn type_name(self) -> &'static str {
        match self {
            CellKind::Null => "null",
            CellKind::Int => "int",
            CellKind::Float => "float",
            CellKind::Str => "str",
            CellKind::Bool => "bool",
            CellKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Classify a cell by its runtime type.
///
/// A `NaN` float is the tabular missing-value marker and classifies as
/// [`CellKind::Null`]. Infinite floats are real values.
pub fn classify(cell: &Cell) -> CellKind {
    match cell {
        Cell::Null => CellKind::Null,
        Cell::Float(f) if f.is_nan() => CellKind::Null,
        Cell::Float(_) => CellKind::Float,
        Cell::Int(_) => CellKind::Int,
        Cell::Str(_) => CellKind::Str,
        Cell::Bool(_) => CellKind::Bool,
        Cell::DateTime(_) => CellKind::DateTime,
    }
}

/// Hashable identity of a non-null cell, used for distinct counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        classify(self)
    }

    pub fn is_null(&self) -> bool {
        self.kind() == CellKind::Null
    }

    /// Distinct-value key, `None` for nulls.
    pub fn key(&self) -> Option<CellKey> {
        match self {
            Cell::Null => None,
            Cell::Float(f) if f.is_nan() => None,
            // -0.0 and 0.0 are the same value
            Cell::Float(f) if *f == 0.0 => Some(CellKey::Float(0f64.to_bits())),
            Cell::Float(f) => Some(CellKey::Float(f.to_bits())),
            Cell::Int(i) => Some(CellKey::Int(*i)),
            Cell::Str(s) => Some(CellKey::Str(s.clone())),
            Cell::Bool(b) => Some(CellKey::Bool(*b)),
            Cell::DateTime(dt) => Some(CellKey::DateTime(*dt)),
        }
    }

    /// Numeric value of the cell.
    ///
    /// Integers and finite-or-infinite floats map directly; strings are
    /// coerced when they read as a number. Everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_nan() => None,
            Cell::Float(f) => Some(*f),
            Cell::Str(s) => crate::utils::parse_numeric_string(s),
            _ => None,
        }
    }

    /// Approximate heap + inline footprint in bytes.
    pub fn estimated_size(&self) -> usize {
        let inline = std::mem::size_of::<Cell>();
        match self {
            Cell::Str(s) => inline + s.len(),
            _ => inline,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Str(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Str(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Str(v)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(v: NaiveDateTime) -> Self {
        Cell::DateTime(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Convert a JSON scalar into a cell.
///
/// Nested arrays and objects are kept as their compact JSON text.
pub fn cell_from_json(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Int(i)
            } else {
                n.as_f64().map(Cell::Float).unwrap_or(Cell::Null)
            }
        }
        Value::String(s) => Cell::Str(s.clone()),
        other => Cell::Str(other.to_string()),
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Storage type of a column as declared by its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Integer,
    Float,
    Boolean,
    String,
    Datetime,
    Date,
    Object,
}

impl DeclaredType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DeclaredType::Integer | DeclaredType::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclaredType::Integer => "integer",
            DeclaredType::Float => "float",
            DeclaredType::Boolean => "boolean",
            DeclaredType::String => "string",
            DeclaredType::Datetime => "datetime",
            DeclaredType::Date => "date",
            DeclaredType::Object => "object",
        }
    }

    /// Storage type a container would pick for these cells.
    ///
    /// One non-null kind maps to its storage type, integers mixed with
    /// floats upcast to float, and anything else is `object`.
    pub fn from_cells(values: &[Cell]) -> Self {
        let kinds: HashSet<CellKind> = values
            .iter()
            .map(|c| match c {
                // NaN still occupies float storage
                Cell::Float(_) => CellKind::Float,
                other => other.kind(),
            })
            .filter(|k| *k != CellKind::Null)
            .collect();

        match kinds.len() {
            0 => DeclaredType::Object,
            1 => match kinds.iter().next() {
                Some(CellKind::Int) => DeclaredType::Integer,
                Some(CellKind::Float) => DeclaredType::Float,
                Some(CellKind::Str) => DeclaredType::String,
                Some(CellKind::Bool) => DeclaredType::Boolean,
                Some(CellKind::DateTime) => DeclaredType::Datetime,
                _ => DeclaredType::Object,
            },
            2 if kinds.contains(&CellKind::Int) && kinds.contains(&CellKind::Float) => {
                DeclaredType::Float
            }
            _ => DeclaredType::Object,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub declared_type: DeclaredType,
    pub values: Vec<Cell>,
}

impl Column {
    /// Build a column, deriving its declared type from the cells.
    ///
    /// Integer cells in a float column are upcast, mirroring numeric storage.
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        let declared_type = DeclaredType::from_cells(&values);
        Self::with_declared_type(name, declared_type, values)
    }

    /// Build a column with an explicit declared type.
    pub fn with_declared_type(
        name: impl Into<String>,
        declared_type: DeclaredType,
        values: Vec<Cell>,
    ) -> Self {
        let values = if declared_type == DeclaredType::Float {
            values
                .into_iter()
                .map(|c| match c {
                    Cell::Int(i) => Cell::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            values
        };

        Self {
            name: name.into(),
            declared_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-null cells with their row positions.
    pub fn non_null(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.values.iter().enumerate().filter(|(_, c)| !c.is_null())
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|c| c.is_null()).count()
    }
}

// =============================================================================
// Tables
// =============================================================================

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, validating equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ProfilingError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(ProfilingError::RaggedTable {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to profile.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ProfilingError::ColumnNotFound(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cells of one row in column order, `None` past the last row.
    pub fn row(&self, index: usize) -> Option<Vec<(&str, &Cell)>> {
        if index >= self.height() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), &c.values[index]))
                .collect(),
        )
    }

    /// Approximate in-memory footprint of the table in bytes.
    pub fn estimated_size_bytes(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.name.len() + c.values.iter().map(Cell::estimated_size).sum::<usize>())
            .sum()
    }

    /// Build a table from JSON objects.
    ///
    /// Columns appear in first-seen key order; keys missing from a record
    /// are nulls in that row.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                ProfilingError::InvalidRecords(format!("record {i} is not a JSON object"))
            })?;
            for key in object.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).map(cell_from_json).unwrap_or(Cell::Null))
                    .collect();
                Column::new(name, values)
            })
            .collect();

        Table::new(columns)
    }

    /// Convert a polars DataFrame, keeping its dtypes as declared types.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                let declared = declared_type_for(series.dtype());
                let values = series.iter().map(any_value_to_cell).collect();
                Column::with_declared_type(series.name().to_string(), declared, values)
            })
            .collect();

        Table::new(columns)
    }
}

/// Load a CSV file as a table, reading it through polars.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let df = read_csv(path).context(format!("Failed to read CSV '{}'", path.display()))?;
    debug!("Loaded CSV with shape {:?}", df.shape());
    Table::from_dataframe(&df)
}

/// Map a polars value to a cell.
///
/// Dates and datetimes become [`Cell::DateTime`]; exotic dtypes fall back to
/// their display string.
fn any_value_to_cell(value: AnyValue) -> Cell {
    match value {
        AnyValue::Null => Cell::Null,
        AnyValue::Boolean(b) => Cell::Bool(b),

        AnyValue::Int8(i) => Cell::Int(i.into()),
        AnyValue::Int16(i) => Cell::Int(i.into()),
        AnyValue::Int32(i) => Cell::Int(i.into()),
        AnyValue::Int64(i) => Cell::Int(i),
        AnyValue::UInt8(u) => Cell::Int(u.into()),
        AnyValue::UInt16(u) => Cell::Int(u.into()),
        AnyValue::UInt32(u) => Cell::Int(u.into()),
        AnyValue::UInt64(u) => i64::try_from(u)
            .map(Cell::Int)
            .unwrap_or(Cell::Float(u as f64)),

        AnyValue::Float32(f) => Cell::Float(f.into()),
        AnyValue::Float64(f) => Cell::Float(f),

        AnyValue::String(s) => Cell::Str(s.to_string()),
        AnyValue::StringOwned(s) => Cell::Str(s.to_string()),

        AnyValue::Date(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map(|dt| Cell::DateTime(dt.naive_utc()))
            .unwrap_or(Cell::Null),
        AnyValue::Datetime(v, unit, _) => {
            let parsed = match unit {
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
            };
            parsed
                .map(|dt| Cell::DateTime(dt.naive_utc()))
                .unwrap_or(Cell::Null)
        }

        other => Cell::Str(format!("{}", other)),
    }
}

/// Read a CSV file, retrying with looser settings when the first pass fails.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard CSV loading failed: {}", e),
    }

    // Strategy 2: without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("CSV loading without quotes failed: {}", e),
    }

    // Strategy 3: pre-clean content
    let content = std::fs::read_to_string(path)?;
    let cursor = Cursor::new(clean_csv_content(&content));
    Ok(CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .into_reader_with_file_handle(cursor)
        .finish()?)
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Count string cells that are blank after trimming.
pub fn blank_string_count(column: &Column) -> usize {
    column
        .values
        .iter()
        .filter(|c| matches!(c, Cell::Str(s) if s.trim().is_empty()))
        .count()
}
