//! Core data models for ledgerdesk
//!
//! This module contains the data structures behind the row store and the
//! report renderer: column schemas, cell values, databases and report
//! definitions.

pub mod column;
pub mod database;
pub mod ids;
pub mod report;
pub mod value;

pub use column::{ColumnDefinition, DataType, DatabaseSchema, SchemaValidationError};
pub use database::{Database, DatabaseValidationError};
pub use ids::{DatabaseId, ReportId};
pub use report::{FormulaRow, ReportColumn, ReportColumnKind, ReportDefinition, ReportValidationError};
pub use value::{CellValue, Row, TypedValue};
