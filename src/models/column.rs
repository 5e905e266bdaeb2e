//! Column schema model
//!
//! A database's shape is user data: an ordered list of typed columns that is
//! validated when the database is created rather than at compile time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Data type of a user-defined column
///
/// Deserialized from its lowercase name. Names outside the fixed set are kept
/// as `Unknown` so that schema validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Text,
    Number,
    Date,
    Boolean,
    Currency,
    Dropdown,
    File,
    Unknown(String),
}

impl DataType {
    /// Parse a data type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" => Some(Self::Boolean),
            "currency" => Some(Self::Currency),
            "dropdown" => Some(Self::Dropdown),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Currency => "currency",
            Self::Dropdown => "dropdown",
            Self::File => "file",
            Self::Unknown(name) => name,
        }
    }

    /// Returns true for types whose values take part in arithmetic
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Currency)
    }
}

impl From<String> for DataType {
    fn from(s: String) -> Self {
        Self::parse(&s).unwrap_or(Self::Unknown(s))
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single column in a database schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Key used in stored rows; unique, must not start with '_'
    pub key: String,

    /// Human-readable label; unique case-insensitively
    pub label: String,

    /// Declared value type
    pub data_type: DataType,

    /// Whether every row must carry a non-empty value
    #[serde(default)]
    pub required: bool,

    /// Display and key-building order
    #[serde(default)]
    pub order: u32,

    /// Allowed values for dropdown columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ColumnDefinition {
    /// Create a new optional column
    pub fn new(key: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            data_type,
            required: false,
            order: 0,
            options: Vec::new(),
        }
    }

    /// Mark the column as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the display order
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set dropdown options
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered column list plus a version counter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub columns: Vec<ColumnDefinition>,
    #[serde(default = "default_schema_version")]
    pub version: u32,
}

fn default_schema_version() -> u32 {
    1
}

impl DatabaseSchema {
    /// Create a version-1 schema from columns
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self {
            columns,
            version: default_schema_version(),
        }
    }

    /// Columns sorted by declared order (stable for equal orders)
    pub fn ordered_columns(&self) -> Vec<&ColumnDefinition> {
        let mut columns: Vec<&ColumnDefinition> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        columns
    }

    /// Look up a column by key
    pub fn column(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Check whether a key is declared
    pub fn has_column(&self, key: &str) -> bool {
        self.column(key).is_some()
    }

    /// Validate the schema, returning the first violation found
    pub fn validate(&self, max_columns: usize) -> Result<(), SchemaValidationError> {
        if self.columns.is_empty() {
            return Err(SchemaValidationError::NoColumns);
        }

        if self.columns.len() > max_columns {
            return Err(SchemaValidationError::TooManyColumns {
                count: self.columns.len(),
                max: max_columns,
            });
        }

        let mut keys = HashSet::new();
        let mut labels = HashSet::new();

        for (index, column) in self.columns.iter().enumerate() {
            let key = column.key.trim();
            if key.is_empty() {
                return Err(SchemaValidationError::EmptyKey(index + 1));
            }
            if key.starts_with('_') {
                return Err(SchemaValidationError::ReservedKey(key.to_string()));
            }
            if !is_valid_key(&column.key) {
                return Err(SchemaValidationError::InvalidKey(column.key.clone()));
            }
            if !keys.insert(key.to_string()) {
                return Err(SchemaValidationError::DuplicateKey(key.to_string()));
            }

            let label = column.label.trim();
            if label.is_empty() {
                return Err(SchemaValidationError::EmptyLabel(key.to_string()));
            }
            if !labels.insert(label.to_lowercase()) {
                return Err(SchemaValidationError::DuplicateLabel(label.to_string()));
            }

            if let DataType::Unknown(name) = &column.data_type {
                return Err(SchemaValidationError::InvalidDataType {
                    key: key.to_string(),
                    data_type: name.clone(),
                });
            }

            if column.data_type == DataType::Dropdown
                && !column.options.iter().any(|o| !o.trim().is_empty())
            {
                return Err(SchemaValidationError::MissingDropdownOptions(key.to_string()));
            }
        }

        Ok(())
    }
}

/// Keys must be usable as formula identifiers: an ASCII letter followed by
/// ASCII letters, digits or underscores
fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validation errors for schemas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaValidationError {
    NoColumns,
    TooManyColumns { count: usize, max: usize },
    EmptyKey(usize),
    ReservedKey(String),
    InvalidKey(String),
    DuplicateKey(String),
    EmptyLabel(String),
    DuplicateLabel(String),
    InvalidDataType { key: String, data_type: String },
    MissingDropdownOptions(String),
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoColumns => write!(f, "Schema must declare at least one column"),
            Self::TooManyColumns { count, max } => {
                write!(f, "Schema has too many columns ({}, max {})", count, max)
            }
            Self::EmptyKey(position) => write!(f, "Column {} has an empty key", position),
            Self::ReservedKey(key) => write!(
                f,
                "Column key '{}' is reserved (keys cannot start with '_')",
                key
            ),
            Self::InvalidKey(key) => write!(
                f,
                "Column key '{}' must start with a letter and contain only letters, digits and '_'",
                key
            ),
            Self::DuplicateKey(key) => write!(f, "Duplicate column key '{}'", key),
            Self::EmptyLabel(key) => write!(f, "Column '{}' has an empty label", key),
            Self::DuplicateLabel(label) => write!(f, "Duplicate column label '{}'", label),
            Self::InvalidDataType { key, data_type } => write!(
                f,
                "Column '{}' has invalid data type '{}' (expected text, number, date, boolean, currency, dropdown or file)",
                key, data_type
            ),
            Self::MissingDropdownOptions(key) => write!(
                f,
                "Dropdown column '{}' must declare at least one option",
                key
            ),
        }
    }
}

impl std::error::Error for SchemaValidationError {}
