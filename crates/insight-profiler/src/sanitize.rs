//! Strict-JSON coercion for profiles and sampled rows.
//!
//! JSON has no NaN or infinity. Every float that leaves the profiler goes
//! through [`finite`] or the [`Sanitize`] pass, and every cell goes through
//! [`cell_to_json`].

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::warn;

use crate::table::{Cell, Table};
use crate::types::{
    ColumnProfile, CorrelationMatrix, DatasetProfile, Histogram, NumericalStats, Row,
    TableProfile,
};

/// ISO format used for datetime cells and date ranges.
pub const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// `Some(v)` when `v` is finite.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Convert a cell to a JSON-safe value.
pub fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Int(i) => Value::from(*i),
        Cell::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Cell::Str(s) => Value::String(s.clone()),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::DateTime(dt) => Value::String(dt.format(ISO_DATETIME_FORMAT).to_string()),
    }
}

/// One table row as a JSON object in column order.
pub fn row_to_json(table: &Table, index: usize) -> Option<Row> {
    table.row(index).map(|cells| {
        cells
            .into_iter()
            .map(|(name, cell)| (name.to_string(), cell_to_json(cell)))
            .collect()
    })
}

/// Serialize to a JSON value, falling back to a string on failure.
pub fn to_json_value<T: Serialize + fmt::Debug>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => sanitize_value(json),
        Err(e) => {
            warn!("JSON conversion failed, falling back to string: {}", e);
            Value::String(format!("{value:?}"))
        }
    }
}

/// Recursively drop non-finite numbers from a JSON value.
///
/// `serde_json` cannot hold NaN, but numbers parsed with arbitrary precision
/// can still overflow to infinity when read back as `f64`.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::Null,
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Replace non-finite floats in place.
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl Sanitize for Option<f64> {
    fn sanitize(&mut self) {
        *self = self.and_then(finite);
    }
}

impl Sanitize for Option<Histogram> {
    fn sanitize(&mut self) {
        if self
            .as_ref()
            .is_some_and(|h| h.bin_edges.iter().any(|e| !e.is_finite()))
        {
            *self = None;
        }
    }
}

impl Sanitize for NumericalStats {
    fn sanitize(&mut self) {
        self.min.sanitize();
        self.max.sanitize();
        self.mean.sanitize();
        self.median.sanitize();
        self.std.sanitize();
        self.histogram.sanitize();
    }
}

impl Sanitize for CorrelationMatrix {
    fn sanitize(&mut self) {
        for value in self.values.iter_mut().flatten() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
    }
}

impl Sanitize for ColumnProfile {
    fn sanitize(&mut self) {
        if !self.null_percent.is_finite() {
            self.null_percent = 0.0;
        }
        if let Some(stats) = self.numerical_stats.as_mut() {
            stats.sanitize();
        }
    }
}

impl Sanitize for TableProfile {
    fn sanitize(&mut self) {
        if !self.file_size_estimate_mb.is_finite() {
            self.file_size_estimate_mb = 0.0;
        }
        for column in &mut self.columns {
            column.sanitize();
        }
        if let Some(matrix) = self.correlation_matrix.as_mut() {
            matrix.sanitize();
        }
    }
}

impl Sanitize for DatasetProfile {
    fn sanitize(&mut self) {
        self.profile.sanitize();
    }
}
