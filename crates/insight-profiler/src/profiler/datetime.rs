//! Lenient date/time parsing and datetime column detection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::sanitize::ISO_DATETIME_FORMAT;
use crate::table::{Cell, Column, DeclaredType};
use crate::types::{DatePattern, DateRange, DatetimeParts};

// Shapes that never parse as dates - compiled once at startup
static NUMERIC_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("Invalid regex: numeric"));
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("Invalid regex: YYYY-MM"));

const HOUR_MINUTE: DatetimeParts = DatetimeParts {
    year: true,
    month: true,
    day: true,
    hour: true,
    minute: true,
    second: false,
};

const YEAR_MONTH_PARTS: DatetimeParts = DatetimeParts {
    year: true,
    month: true,
    day: false,
    hour: false,
    minute: false,
    second: false,
};

/// Naive formats carrying a time of day. Month-first before day-first.
const DATETIME_FORMATS: &[(&str, DatetimeParts)] = &[
    ("%Y-%m-%dT%H:%M:%S%.f", DatetimeParts::FULL),
    ("%Y-%m-%d %H:%M:%S%.f", DatetimeParts::FULL),
    ("%Y-%m-%dT%H:%M", HOUR_MINUTE),
    ("%Y-%m-%d %H:%M", HOUR_MINUTE),
    ("%Y/%m/%d %H:%M:%S", DatetimeParts::FULL),
    ("%Y/%m/%d %H:%M", HOUR_MINUTE),
    ("%m/%d/%Y %H:%M:%S", DatetimeParts::FULL),
    ("%m/%d/%Y %H:%M", HOUR_MINUTE),
    ("%d/%m/%Y %H:%M:%S", DatetimeParts::FULL),
    ("%d/%m/%Y %H:%M", HOUR_MINUTE),
];

/// Formats with a UTC offset.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Date-only formats. Month-first before day-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// A successfully parsed value and the components its text carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDatetime {
    pub value: NaiveDateTime,
    pub parts: DatetimeParts,
}

impl ParsedDatetime {
    fn new(value: NaiveDateTime, parts: DatetimeParts) -> Self {
        Self { value, parts }
    }
}

/// Parse a date/time string leniently.
///
/// Returns `None` for anything that is not recognizably a date, including
/// bare numbers. Values with an offset are normalized to UTC.
pub fn parse_datetime(text: &str) -> Option<ParsedDatetime> {
    let s = text.trim();
    if s.is_empty() || s.len() > 64 || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if NUMERIC_LIKE.is_match(s) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedDatetime::new(dt.naive_utc(), DatetimeParts::FULL));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(ParsedDatetime::new(dt.naive_utc(), DatetimeParts::FULL));
        }
    }

    for (fmt, parts) in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ParsedDatetime::new(dt, *parts));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(ParsedDatetime::new(
                date.and_time(NaiveTime::MIN),
                DatetimeParts::DATE,
            ));
        }
    }

    if let Some(parsed) = parse_year_month(s) {
        return Some(parsed);
    }

    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| ParsedDatetime::new(dt.naive_utc(), DatetimeParts::FULL))
}

fn parse_year_month(s: &str) -> Option<ParsedDatetime> {
    let date = if let Some(caps) = YEAR_MONTH.captures(s) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)?
    } else {
        // "March 2024", "Mar 2024"
        NaiveDate::parse_from_str(&format!("1 {s}"), "%d %B %Y").ok()?
    };
    Some(ParsedDatetime::new(
        date.and_time(NaiveTime::MIN),
        YEAR_MONTH_PARTS,
    ))
}

/// Datetime details of a column that passed detection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DatetimeSummary {
    pub parts: DatetimeParts,
    pub pattern: DatePattern,
    pub range: Option<DateRange>,
}

/// Detect whether a column holds dates.
///
/// The column qualifies when parsed cells are strictly more than
/// `threshold` of its non-null cells. Typed datetime cells count as parsed;
/// numeric and boolean cells never do.
pub(crate) fn detect_datetime(column: &Column, threshold: f64) -> Option<DatetimeSummary> {
    let typed_parts = if column.declared_type == DeclaredType::Date {
        DatetimeParts::DATE
    } else {
        DatetimeParts::FULL
    };

    let mut non_null = 0usize;
    let mut parsed = 0usize;
    let mut parts = DatetimeParts::default();
    let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;

    for (_, cell) in column.non_null() {
        non_null += 1;
        let result = match cell {
            Cell::DateTime(dt) => Some(ParsedDatetime::new(*dt, typed_parts)),
            Cell::Str(s) => parse_datetime(s),
            _ => None,
        };
        let Some(p) = result else { continue };

        parsed += 1;
        parts = parts.merge(p.parts);
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(p.value), hi.max(p.value)),
            None => (p.value, p.value),
        });
    }

    if non_null == 0 || parsed as f64 <= threshold * non_null as f64 {
        return None;
    }

    Some(DatetimeSummary {
        parts,
        pattern: DatePattern::from_parts(&parts),
        range: bounds.map(|(lo, hi)| DateRange {
            min: lo.format(ISO_DATETIME_FORMAT).to_string(),
            max: hi.format(ISO_DATETIME_FORMAT).to_string(),
        }),
    })
}
