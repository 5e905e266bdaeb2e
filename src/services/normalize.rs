//! Value normalization for duplicate detection
//!
//! Two cells are considered equal when their normalized strings match. Typed
//! columns normalize through their data type; untyped input falls back to
//! shape sniffing, so `"$1,234.56"` and `"1234.56"` both become `"1234.56"`.

use crate::models::value::{canonical_number, parse_boolean, parse_date, parse_number};
use crate::models::{CellValue, ColumnDefinition, DataType, DatabaseSchema, Row};

/// Separates normalized cells inside a row key
const KEY_DELIMITER: char = '\u{1f}';

/// Normalize one cell, optionally using its column's declared type
pub fn normalize_cell(value: &CellValue, column: Option<&ColumnDefinition>) -> String {
    if value.is_empty() {
        return String::new();
    }

    if let Some(column) = column {
        match column.data_type {
            DataType::Text | DataType::File | DataType::Unknown(_) => {}
            _ => {
                if let Ok(Some(typed)) = column.coerce(value) {
                    return typed.canonical();
                }
            }
        }
    }

    normalize_untyped(value)
}

fn normalize_untyped(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Boolean(b) => b.to_string(),
        CellValue::Number(n) => canonical_number(*n),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if let Some(n) = parse_number(trimmed) {
                canonical_number(n)
            } else if let Some(b) = parse_boolean(trimmed) {
                b.to_string()
            } else if let Some(d) = parse_date(trimmed) {
                d.format("%Y-%m-%d").to_string()
            } else {
                trimmed.to_string()
            }
        }
    }
}

/// Whole-row key: every schema column in declared order, normalized
///
/// Keys absent from the row count as empty, and keys outside the schema are
/// ignored, so two rows collide exactly when they agree on every column.
pub fn row_key(row: &Row, schema: &DatabaseSchema) -> String {
    let mut key = String::new();
    for (i, column) in schema.ordered_columns().into_iter().enumerate() {
        if i > 0 {
            key.push(KEY_DELIMITER);
        }
        let value = row.get(&column.key).unwrap_or(&CellValue::Null);
        key.push_str(&normalize_cell(value, Some(column)));
    }
    key
}

/// Composite key over the given identifier columns
pub fn composite_key(row: &Row, identifier_keys: &[String], schema: &DatabaseSchema) -> Vec<String> {
    identifier_keys
        .iter()
        .map(|key| {
            let value = row.get(key).unwrap_or(&CellValue::Null);
            normalize_cell(value, schema.column(key))
        })
        .collect()
}

/// Normalize a caller-supplied key tuple so it compares with [`composite_key`]
pub fn normalize_key_tuple(
    tuple: &[String],
    identifier_keys: &[String],
    schema: &DatabaseSchema,
) -> Vec<String> {
    tuple
        .iter()
        .zip(identifier_keys)
        .map(|(value, key)| normalize_cell(&CellValue::from(value.as_str()), schema.column(key)))
        .collect()
}
