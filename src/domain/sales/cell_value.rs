// ============================================================
// CELL VALUES
// ============================================================
// Scalar values held by dataset columns, plus the lenient number
// and date parsing used when inferring a column's type

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

static CURRENCY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:usd|eur|mxn|[$€£¥])\s*|\s*(?:usd|eur|mxn|[$€£¥])$").unwrap()
});

static COMMA_THOUSANDS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

static DOT_THOUSANDS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?\d{1,3}(\.\d{3}){2,}$").unwrap());

static DATE_SHAPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}").unwrap());

/// Date-time layouts tried before plain dates (the time part is dropped).
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Plain date layouts. Day-first wins over month-first when both parse.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

/// Inferred scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// No non-empty value observed
    Empty,
    Numeric,
    Text,
    Date,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Empty => write!(f, "empty"),
            ScalarType::Numeric => write!(f, "numeric"),
            ScalarType::Text => write!(f, "text"),
            ScalarType::Date => write!(f, "date"),
        }
    }
}

/// A single cell of a dataset column
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    /// Build a cell from raw text, mapping blank strings to `Empty`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Interpret the cell as a number, parsing text if needed.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => parse_number(text),
            _ => None,
        }
    }

    /// Interpret the cell as a date, parsing text if needed.
    pub fn coerce_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(value) => Some(*value),
            CellValue::Text(text) => parse_date(text),
            _ => None,
        }
    }

    /// Render the cell as text (used for labels and text columns).
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{:.0}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            CellValue::Text(value) => write!(f, "{}", value),
            CellValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(value) => serializer.serialize_f64(*value),
            CellValue::Text(value) => serializer.serialize_str(value),
            CellValue::Date(value) => {
                serializer.serialize_str(&value.format("%Y-%m-%d").to_string())
            }
        }
    }
}

/// Parse a number written the way spreadsheets export them.
///
/// Accepts currency markers, `1,234.50` and `1.234,50` grouping, and a
/// trailing `%` (the result is divided by 100).
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (body, percent) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    };

    let cleaned = CURRENCY_PATTERN.replace_all(body, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().any(char::is_whitespace) {
        return None;
    }

    let normalized = normalize_separators(cleaned)?;
    let value = normalized.parse::<f64>().ok().filter(|v| v.is_finite())?;

    Some(if percent { value / 100.0 } else { value })
}

fn normalize_separators(value: &str) -> Option<String> {
    let last_comma = value.rfind(',');
    let last_dot = value.rfind('.');

    match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                // 1.234,50
                Some(value.replace('.', "").replace(',', "."))
            } else {
                // 1,234.50
                Some(value.replace(',', ""))
            }
        }
        (Some(_), None) => {
            if COMMA_THOUSANDS_PATTERN.is_match(value) {
                Some(value.replace(',', ""))
            } else if value.matches(',').count() == 1 {
                Some(value.replace(',', "."))
            } else {
                None
            }
        }
        (None, Some(_)) => {
            if DOT_THOUSANDS_PATTERN.is_match(value) {
                Some(value.replace('.', ""))
            } else {
                Some(value.to_string())
            }
        }
        (None, None) => Some(value.to_string()),
    }
}

/// Parse a date in one of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !DATE_SHAPE_PATTERN.is_match(trimmed) {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Convert a spreadsheet serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
