//! Cell values and rows
//!
//! Rows are stored as flat maps from column key to a JSON scalar. Typing is
//! applied at the store boundary by coercing each scalar against its column's
//! declared data type.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::column::{ColumnDefinition, DataType};

/// A stored row: column key to scalar value
pub type Row = BTreeMap<String, CellValue>;

/// A JSON scalar as supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Null, or a string that is empty after trimming
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value, if it has one
    ///
    /// Text is parsed with [`parse_number`], so currency symbols and thousands
    /// separators are accepted. Booleans have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => parse_number(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", canonical_number(*n)),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A value interpreted through its column's data type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Currency(f64),
    Date(NaiveDate),
    Boolean(bool),
    Choice(String),
    File(String),
}

impl TypedValue {
    /// Canonical string used for equality comparisons
    pub fn canonical(&self) -> String {
        match self {
            Self::Text(s) | Self::File(s) => s.trim().to_string(),
            Self::Choice(s) => s.clone(),
            Self::Number(n) | Self::Currency(n) => canonical_number(*n),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }
}

impl ColumnDefinition {
    /// Coerce a cell into this column's type
    ///
    /// Returns `Ok(None)` for empty cells. The error string names the column
    /// label and the offending value.
    pub fn coerce(&self, value: &CellValue) -> Result<Option<TypedValue>, String> {
        if value.is_empty() {
            return Ok(None);
        }

        let raw = value.to_string();
        let typed = match &self.data_type {
            DataType::Text => Some(TypedValue::Text(raw.clone())),
            DataType::File => Some(TypedValue::File(raw.clone())),
            DataType::Number => value.as_number().map(TypedValue::Number),
            DataType::Currency => value.as_number().map(TypedValue::Currency),
            DataType::Date => parse_date(&raw).map(TypedValue::Date),
            DataType::Boolean => match value {
                CellValue::Boolean(b) => Some(TypedValue::Boolean(*b)),
                _ => parse_boolean(&raw).map(TypedValue::Boolean),
            },
            DataType::Dropdown => self
                .options
                .iter()
                .find(|o| o.trim().eq_ignore_ascii_case(raw.trim()))
                .map(|o| TypedValue::Choice(o.trim().to_string())),
            DataType::Unknown(_) => None,
        };

        typed.map(Some).ok_or_else(|| {
            format!(
                "'{}' expects {}, got '{}'",
                self.label,
                expected_description(&self.data_type),
                raw
            )
        })
    }
}

fn expected_description(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Number => "a number",
        DataType::Currency => "a currency amount",
        DataType::Date => "a date",
        DataType::Boolean => "a yes/no value",
        DataType::Dropdown => "one of its dropdown options",
        DataType::Text | DataType::File => "text",
        DataType::Unknown(_) => "a known data type",
    }
}

/// Format a number without trailing zeros ("100", "1234.56", never "-0")
pub fn canonical_number(n: f64) -> String {
    let n = if n == 0.0 { 0.0 } else { n };
    format!("{}", n)
}

/// Parse a numeric-looking string
///
/// Accepts a leading sign, accounting-style parentheses for negatives,
/// the currency symbols `$ £ € ¥` and comma thousands separators:
/// `"$1,234.56"`, `"-€20"`, `"(50.00)"`.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (negative, body) = if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        (true, &s[1..s.len() - 1])
    } else if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };

    let body = body.trim();
    // Sign may also follow the currency symbol: "$-20"
    let body = body.trim_start_matches(['$', '£', '€', '¥']).trim_start();
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) if !negative => (true, rest),
        _ => (negative, body),
    };

    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty()
        || !cleaned.chars().any(|c| c.is_ascii_digit())
        || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.')
        || cleaned.matches('.').count() > 1
    {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a boolean-looking string (`true/yes/1/y`, `false/no/0/n`)
pub fn parse_boolean(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "y" => Some(true),
        "false" | "no" | "0" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a date-looking string
///
/// ISO dates and timestamps are tried first, then US-style month-first
/// formats, then day-first formats for values that cannot be month-first.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    let first = s.split(['/', '-']).next().unwrap_or("");
    let last = s.rsplit(['/', '-']).next().unwrap_or("");
    let two_digit_year = last.len() == 2 && first.len() <= 2;

    let formats: &[&str] = if two_digit_year {
        &["%m/%d/%y", "%d/%m/%y", "%m-%d-%y"]
    } else {
        &[
            "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%b %d, %Y",
            "%B %d, %Y", "%d %b %Y", "%d %B %Y",
        ]
    };

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_serde_untagged() {
        let row: Row = serde_json::from_str(
            r#"{"a": null, "b": true, "c": 12, "d": "$1,234.56"}"#,
        )
        .unwrap();
        assert_eq!(row["a"], CellValue::Null);
        assert_eq!(row["b"], CellValue::Boolean(true));
        assert_eq!(row["c"], CellValue::Number(12.0));
        assert_eq!(row["d"], CellValue::Text("$1,234.56".into()));

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"a\":null"));
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("$1,234.56"), Some(1234.56));
        assert_eq!(parse_number("1234.56"), Some(1234.56));
        assert_eq!(parse_number("£20"), Some(20.0));
        assert_eq!(parse_number("-€20"), Some(-20.0));
        assert_eq!(parse_number("$-20"), Some(-20.0));
        assert_eq!(parse_number("(50.00)"), Some(-50.0));
        assert_eq!(parse_number("¥ 1,000"), Some(1000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("2024-01-05"), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("$"), None);
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("Yes"), Some(true));
        assert_eq!(parse_boolean("y"), Some(true));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("NO"), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expected));
        assert_eq!(parse_date("03/15/2024"), Some(expected));
        assert_eq!(parse_date("15/03/2024"), Some(expected));
        assert_eq!(parse_date("3/15/24"), Some(expected));
        assert_eq!(parse_date("2024-03-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_date("Mar 15, 2024"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_canonical_number() {
        assert_eq!(canonical_number(100.0), "100");
        assert_eq!(canonical_number(1234.56), "1234.56");
        assert_eq!(canonical_number(-0.0), "0");
    }

    #[test]
    fn test_coerce_against_column() {
        let amount = ColumnDefinition::new("amt", "Amount", DataType::Currency);
        assert_eq!(
            amount.coerce(&CellValue::from("$100.00")).unwrap(),
            Some(TypedValue::Currency(100.0))
        );
        assert_eq!(amount.coerce(&CellValue::Null).unwrap(), None);
        let err = amount.coerce(&CellValue::from("abc")).unwrap_err();
        assert!(err.contains("'Amount' expects a currency amount"));

        let status = ColumnDefinition::new("status", "Status", DataType::Dropdown)
            .with_options(["Open", "Closed"]);
        assert_eq!(
            status.coerce(&CellValue::from("open")).unwrap(),
            Some(TypedValue::Choice("Open".into()))
        );
        assert!(status.coerce(&CellValue::from("Pending")).is_err());

        let flag = ColumnDefinition::new("flag", "Flag", DataType::Boolean);
        assert_eq!(
            flag.coerce(&CellValue::Number(1.0)).unwrap(),
            Some(TypedValue::Boolean(true))
        );
    }
}
