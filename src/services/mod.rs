//! Service layer for ledgerdesk
//!
//! The service layer provides business logic on top of the storage layer:
//! schema validation, import reconciliation, report definition checks and
//! the audit entries that accompany every change.

pub mod database;
pub mod import;
pub mod normalize;
pub mod report;
pub mod schema;

pub use database::{CreateDatabaseInput, DatabaseService, DeletedDatabase, RowPage};
pub use import::{reconcile, ImportPreview, ImportResult, ImportService, ParsedRows, Reconciliation};
pub use report::{validate_definition, ReportInput, ReportService};
pub use schema::{ensure_valid_schema, validate_schema};
