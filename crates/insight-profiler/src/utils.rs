//! Shared helpers for dtype mapping, numeric parsing and rounding.

use polars::prelude::DataType;

use crate::table::DeclaredType;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Map a polars dtype to the declared storage type of a column.
pub fn declared_type_for(dtype: &DataType) -> DeclaredType {
    if is_integer_dtype(dtype) {
        DeclaredType::Integer
    } else if is_numeric_dtype(dtype) {
        DeclaredType::Float
    } else {
        match dtype {
            DataType::Boolean => DeclaredType::Boolean,
            DataType::String => DeclaredType::String,
            DataType::Date => DeclaredType::Date,
            DataType::Datetime(_, _) => DeclaredType::Datetime,
            _ => DeclaredType::Object,
        }
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use insight_profiler::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols, percentages and thousands separators. `NaN`
/// spellings are rejected so that coercion never produces a NaN.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| !v.is_nan())
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage of `part` in `total`, rounded to two decimals; 0 when empty.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(part as f64 / total as f64 * 100.0, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::TimeUnit;

    #[test]
    fn test_declared_type_for() {
        assert_eq!(declared_type_for(&DataType::Int64), DeclaredType::Integer);
        assert_eq!(declared_type_for(&DataType::UInt8), DeclaredType::Integer);
        assert_eq!(declared_type_for(&DataType::Float32), DeclaredType::Float);
        assert_eq!(declared_type_for(&DataType::String), DeclaredType::String);
        assert_eq!(declared_type_for(&DataType::Date), DeclaredType::Date);
        assert_eq!(
            declared_type_for(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            DeclaredType::Datetime
        );
        assert_eq!(declared_type_for(&DataType::Null), DeclaredType::Object);
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("Tag-3"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(-0.98765, 2), -0.99);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 5), 100.0);
    }
}
