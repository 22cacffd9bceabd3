use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::table::DeclaredType;

/// A sampled row: column name to JSON-safe value, in column order.
pub type Row = Map<String, Value>;

/// The profiler's semantic classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Integer,
    Floating,
    String,
    Boolean,
    Datetime,
    Mixed,
    /// No non-null cell to classify.
    Empty,
}

impl InferredType {
    pub fn is_numeric(self) -> bool {
        matches!(self, InferredType::Integer | InferredType::Floating)
    }

    /// Types eligible for categorical summarization.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            InferredType::String | InferredType::Boolean | InferredType::Mixed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InferredType::Integer => "integer",
            InferredType::Floating => "floating",
            InferredType::String => "string",
            InferredType::Boolean => "boolean",
            InferredType::Datetime => "datetime",
            InferredType::Mixed => "mixed",
            InferredType::Empty => "empty",
        }
    }
}

/// Count of cells of one runtime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    pub type_name: String,
    pub count: usize,
}

/// One categorical value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Which date/time components appear in a datetime column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatetimeParts {
    pub year: bool,
    pub month: bool,
    pub day: bool,
    pub hour: bool,
    pub minute: bool,
    pub second: bool,
}

impl DatetimeParts {
    pub const DATE: DatetimeParts = DatetimeParts {
        year: true,
        month: true,
        day: true,
        hour: false,
        minute: false,
        second: false,
    };

    pub const FULL: DatetimeParts = DatetimeParts {
        year: true,
        month: true,
        day: true,
        hour: true,
        minute: true,
        second: true,
    };

    /// Component-wise OR.
    pub fn merge(self, other: DatetimeParts) -> DatetimeParts {
        DatetimeParts {
            year: self.year || other.year,
            month: self.month || other.month,
            day: self.day || other.day,
            hour: self.hour || other.hour,
            minute: self.minute || other.minute,
            second: self.second || other.second,
        }
    }

    pub fn has_time(&self) -> bool {
        self.hour || self.minute || self.second
    }
}

/// Granularity of a datetime column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePattern {
    Datetime,
    Date,
    YearMonth,
    Unknown,
}

impl DatePattern {
    pub fn from_parts(parts: &DatetimeParts) -> Self {
        match (parts.year && parts.month, parts.day, parts.has_time()) {
            (true, true, true) => DatePattern::Datetime,
            (true, true, false) => DatePattern::Date,
            (true, false, _) => DatePattern::YearMonth,
            _ => DatePattern::Unknown,
        }
    }
}

/// Earliest and latest parsed value, ISO formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: String,
    pub max: String,
}

/// Equal-width histogram of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub bin_edges: Vec<f64>,
}

/// Summary statistics of a numeric column.
///
/// Row indices are 0-based positions in the profiled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericalStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min_row_index: Option<usize>,
    pub max_row_index: Option<usize>,
    pub histogram: Option<Histogram>,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub declared_type: DeclaredType,
    pub inferred_type: InferredType,
    pub null_count: usize,
    pub null_percent: f64,
    pub empty_string_count: usize,
    pub unique_count: usize,
    pub sample_values: Vec<Value>,
    pub has_mixed_types: bool,
    pub mixed_type_breakdown: Vec<TypeCount>,
    pub is_categorical: bool,
    pub categories: Vec<CategoryCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_parts: Option<DatetimeParts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_pattern: Option<DatePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerical_stats: Option<NumericalStats>,
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// A profile section that was left out because its analysis failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub section: String,
    pub reason: String,
}

/// Profile of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns: Vec<ColumnProfile>,
    /// First rows in table order.
    pub head: Vec<Row>,
    /// Seeded pseudorandom rows, in table order.
    pub sample: Vec<Row>,
    pub file_size_estimate_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_matrix: Option<CorrelationMatrix>,
    #[serde(default)]
    pub skipped: Vec<SkippedSection>,
}

impl TableProfile {
    /// The profile of a table with nothing in it.
    pub fn empty() -> Self {
        Self {
            total_rows: 0,
            total_columns: 0,
            columns: Vec::new(),
            head: Vec::new(),
            sample: Vec::new(),
            file_size_estimate_mb: 0.0,
            correlation_matrix: None,
            skipped: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A table profile labelled with where the data came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub source: String,
    #[serde(flatten)]
    pub profile: TableProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_pattern_from_parts() {
        assert_eq!(
            DatePattern::from_parts(&DatetimeParts::FULL),
            DatePattern::Datetime
        );
        assert_eq!(
            DatePattern::from_parts(&DatetimeParts::DATE),
            DatePattern::Date
        );

        let year_month = DatetimeParts {
            year: true,
            month: true,
            ..Default::default()
        };
        assert_eq!(DatePattern::from_parts(&year_month), DatePattern::YearMonth);
        assert_eq!(
            DatePattern::from_parts(&DatetimeParts::default()),
            DatePattern::Unknown
        );
    }

    #[test]
    fn test_parts_merge() {
        let year_month = DatetimeParts {
            year: true,
            month: true,
            ..Default::default()
        };
        assert_eq!(year_month.merge(DatetimeParts::DATE), DatetimeParts::DATE);
    }

    #[test]
    fn test_inferred_type_serialization() {
        let json = serde_json::to_string(&InferredType::Floating).unwrap();
        assert_eq!(json, "\"floating\"");
        let json = serde_json::to_string(&DatePattern::YearMonth).unwrap();
        assert_eq!(json, "\"yearmonth\"");
    }

    #[test]
    fn test_empty_profile_omits_optional_sections() {
        let json = serde_json::to_value(TableProfile::empty()).unwrap();
        assert_eq!(json["total_rows"], 0);
        assert!(json.get("correlation_matrix").is_none());
        assert_eq!(json["sample"], serde_json::json!([]));
    }
}
