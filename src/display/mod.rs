//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for databases, stored rows, import
//! previews and report definitions. Rendered reports format themselves.

pub mod database;
pub mod import;
pub mod report;

pub use database::{format_database_details, format_database_list, format_rows};
pub use import::{format_import_preview, format_import_result};
pub use report::{format_report_definition, format_report_list};
