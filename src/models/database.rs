//! Database model
//!
//! A database is a user-defined table: a validated schema plus an ordered
//! row collection. Rows are appended by whole-batch import and removed by
//! identifier-key deletion; they are never patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::column::DatabaseSchema;
use super::ids::DatabaseId;
use super::value::Row;

/// A user-defined table with its rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Unique identifier
    pub id: DatabaseId,

    /// Display name (unique case-insensitively)
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Column schema rows are validated against
    pub schema: DatabaseSchema,

    /// Columns forming the composite key used to address rows for deletion
    #[serde(default)]
    pub identifier_keys: Vec<String>,

    /// Stored rows in insertion order
    #[serde(default)]
    pub rows: Vec<Row>,

    /// Cached row count, always equal to `rows.len()` after a write
    #[serde(default)]
    pub row_count: usize,

    /// When the database was created
    pub created_at: DateTime<Utc>,

    /// When the database was last modified
    pub updated_at: DateTime<Utc>,
}

impl Database {
    /// Create an empty database
    pub fn new(name: impl Into<String>, schema: DatabaseSchema) -> Self {
        let now = Utc::now();
        Self {
            id: DatabaseId::new(),
            name: name.into(),
            description: String::new(),
            schema,
            identifier_keys: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the row collection, keeping the row count in step
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.row_count = rows.len();
        self.rows = rows;
        self.updated_at = Utc::now();
    }

    /// Rename the database
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Small JSON snapshot for audit entries (rows omitted)
    pub fn audit_snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "columns": self.schema.columns.len(),
            "identifierKeys": self.identifier_keys,
            "rowCount": self.row_count,
        })
    }

    /// Validate the database metadata
    pub fn validate(&self) -> Result<(), DatabaseValidationError> {
        if self.name.trim().is_empty() {
            return Err(DatabaseValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(DatabaseValidationError::NameTooLong(self.name.len()));
        }

        for key in &self.identifier_keys {
            if !self.schema.has_column(key) {
                return Err(DatabaseValidationError::UnknownIdentifierKey(key.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} rows)", self.name, self.row_count)
    }
}

/// Validation errors for database metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseValidationError {
    EmptyName,
    NameTooLong(usize),
    UnknownIdentifierKey(String),
}

impl fmt::Display for DatabaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Database name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Database name too long ({} chars, max 100)", len)
            }
            Self::UnknownIdentifierKey(key) => {
                write!(f, "Identifier key '{}' is not a column in the schema", key)
            }
        }
    }
}

impl std::error::Error for DatabaseValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, ColumnDefinition, DataType};

    fn schema() -> DatabaseSchema {
        DatabaseSchema::new(vec![ColumnDefinition::new(
            "amt",
            "Amount",
            DataType::Currency,
        )])
    }

    #[test]
    fn test_new_database() {
        let db = Database::new("Ledger", schema());
        assert_eq!(db.row_count, 0);
        assert!(db.rows.is_empty());
        assert!(db.identifier_keys.is_empty());
    }

    #[test]
    fn test_set_rows_updates_count() {
        let mut db = Database::new("Ledger", schema());
        let mut row = Row::new();
        row.insert("amt".into(), CellValue::from("$100.00"));
        db.set_rows(vec![row.clone(), row]);
        assert_eq!(db.row_count, 2);
        assert_eq!(db.rows.len(), 2);
    }

    #[test]
    fn test_validation() {
        let mut db = Database::new("Ledger", schema());
        assert!(db.validate().is_ok());

        db.identifier_keys = vec!["missing".into()];
        assert_eq!(
            db.validate(),
            Err(DatabaseValidationError::UnknownIdentifierKey("missing".into()))
        );

        db.identifier_keys.clear();
        db.name = "  ".into();
        assert_eq!(db.validate(), Err(DatabaseValidationError::EmptyName));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let db = Database::new("Ledger", schema());
        let json = serde_json::to_value(&db).unwrap();
        assert!(json.get("rowCount").is_some());
        assert!(json.get("identifierKeys").is_some());

        let back: Database = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, db.id);
    }
}
