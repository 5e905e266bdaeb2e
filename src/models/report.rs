//! Report definition model
//!
//! A report projects one database's rows through output columns (either a
//! passthrough of a source column or a per-row formula) and appends formula
//! rows that aggregate output columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::ids::{DatabaseId, ReportId};

/// How an output column gets its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportColumnKind {
    /// Copy the value of a column in the source database
    Source {
        #[serde(rename = "sourceColumnKey")]
        source_column_key: String,
    },
    /// Evaluate an arithmetic expression over the source row
    Formula { expression: String },
}

/// An output column of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub kind: ReportColumnKind,
}

impl ReportColumn {
    /// Passthrough column
    pub fn source(
        key: impl Into<String>,
        label: impl Into<String>,
        source_column_key: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order: 0,
            kind: ReportColumnKind::Source {
                source_column_key: source_column_key.into(),
            },
        }
    }

    /// Formula column
    pub fn formula(
        key: impl Into<String>,
        label: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            order: 0,
            kind: ReportColumnKind::Formula {
                expression: expression.into(),
            },
        }
    }

    /// Set the display order
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

/// A summary row: output column key to aggregation function name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormulaRow {
    pub label: String,
    #[serde(default)]
    pub functions: BTreeMap<String, String>,
}

impl FormulaRow {
    /// Create an empty formula row
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            functions: BTreeMap::new(),
        }
    }

    /// Aggregate a column with the named function
    pub fn with(mut self, column_key: impl Into<String>, function: impl Into<String>) -> Self {
        self.functions.insert(column_key.into(), function.into());
        self
    }
}

/// A saved report over exactly one database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub id: ReportId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub database_id: DatabaseId,
    pub columns: Vec<ReportColumn>,
    #[serde(default)]
    pub formula_rows: Vec<FormulaRow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportDefinition {
    /// Create a report definition
    pub fn new(
        name: impl Into<String>,
        database_id: DatabaseId,
        columns: Vec<ReportColumn>,
        formula_rows: Vec<FormulaRow>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReportId::new(),
            name: name.into(),
            description: String::new(),
            database_id,
            columns,
            formula_rows,
            created_at: now,
            updated_at: now,
        }
    }

    /// Output columns sorted by declared order
    pub fn ordered_columns(&self) -> Vec<&ReportColumn> {
        let mut columns: Vec<&ReportColumn> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        columns
    }

    /// Structural validation that needs no database
    pub fn validate(&self) -> Result<(), ReportValidationError> {
        if self.name.trim().is_empty() {
            return Err(ReportValidationError::EmptyName);
        }

        if self.columns.is_empty() {
            return Err(ReportValidationError::NoColumns);
        }

        let mut keys = HashSet::new();
        for column in &self.columns {
            if column.key.trim().is_empty() {
                return Err(ReportValidationError::EmptyColumnKey);
            }
            if !keys.insert(column.key.as_str()) {
                return Err(ReportValidationError::DuplicateColumnKey(column.key.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for ReportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} columns)", self.name, self.columns.len())
    }
}

/// Structural validation errors for report definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportValidationError {
    EmptyName,
    NoColumns,
    EmptyColumnKey,
    DuplicateColumnKey(String),
}

impl fmt::Display for ReportValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Report name cannot be empty"),
            Self::NoColumns => write!(f, "Report must declare at least one column"),
            Self::EmptyColumnKey => write!(f, "Report column key cannot be empty"),
            Self::DuplicateColumnKey(key) => write!(f, "Duplicate report column key '{}'", key),
        }
    }
}

impl std::error::Error for ReportValidationError {}
