//! Type inference logic for column analysis.

use crate::table::{CellKind, Column, DeclaredType};
use crate::types::{InferredType, TypeCount};

/// Counts of runtime kinds among the non-null cells of a column.
///
/// Kinds are kept in first-encounter order so ties resolve toward the kind
/// seen first in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KindTally {
    entries: Vec<(CellKind, usize)>,
}

impl KindTally {
    pub fn from_column(column: &Column) -> Self {
        let mut tally = Self::default();
        for (_, cell) in column.non_null() {
            tally.add(cell.kind());
        }
        tally
    }

    fn add(&mut self, kind: CellKind) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((kind, 1)),
        }
    }

    pub fn non_null(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn is_mixed(&self) -> bool {
        self.entries.len() > 1
    }

    /// Most frequent kind; ties go to the first encountered.
    pub fn dominant(&self) -> Option<CellKind> {
        let mut best: Option<(CellKind, usize)> = None;
        for &(kind, count) in &self.entries {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((kind, count));
            }
        }
        best.map(|(kind, _)| kind)
    }

    /// Per-kind counts, most frequent first, stable on ties.
    pub fn breakdown(&self) -> Vec<TypeCount> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
            .into_iter()
            .map(|(kind, count)| TypeCount {
                type_name: kind.type_name().to_string(),
                count,
            })
            .collect()
    }
}

/// Map a runtime kind to the inferred column type.
///
/// Datetime cells land here only when the column failed datetime
/// detection, so they read as `mixed`.
fn kind_to_inferred(kind: CellKind) -> InferredType {
    match kind {
        CellKind::Int => InferredType::Integer,
        CellKind::Float => InferredType::Floating,
        CellKind::Str => InferredType::String,
        CellKind::Bool => InferredType::Boolean,
        CellKind::DateTime => InferredType::Mixed,
        CellKind::Null => InferredType::Empty,
    }
}

/// Infer the semantic type of a column.
///
/// Precedence: declared numeric storage, then datetime detection (passed in
/// as `is_datetime`), then the runtime kinds of the non-null cells.
pub(crate) fn infer_column_type(
    column: &Column,
    tally: &KindTally,
    is_datetime: bool,
) -> InferredType {
    match column.declared_type {
        DeclaredType::Integer => return InferredType::Integer,
        DeclaredType::Float => return InferredType::Floating,
        _ => {}
    }

    if is_datetime {
        return InferredType::Datetime;
    }

    tally
        .dominant()
        .map(kind_to_inferred)
        .unwrap_or(InferredType::Empty)
}

/// Whether a column is summarized with numeric statistics.
///
/// Non-numeric storage mixing several kinds never qualifies, even when its
/// most frequent kind is a number.
pub(crate) fn is_numeric_column(
    declared: DeclaredType,
    inferred: InferredType,
    has_mixed_types: bool,
) -> bool {
    inferred.is_numeric() && (declared.is_numeric() || !has_mixed_types)
}

/// Whether a column may be summarized as categories.
pub(crate) fn is_categorical_candidate(
    declared: DeclaredType,
    inferred: InferredType,
    has_mixed_types: bool,
) -> bool {
    inferred.is_textual() || (has_mixed_types && !declared.is_numeric())
}
