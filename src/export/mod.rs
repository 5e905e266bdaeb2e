//! Export module for ledgerdesk
//!
//! Writes rendered reports in three formats:
//! - CSV: data rows followed by formula rows (spreadsheet-compatible)
//! - JSON: the rendered report shape with export metadata
//! - YAML: the same document, human-readable

pub mod csv;
pub mod json;
pub mod yaml;

pub use csv::export_report_csv;
pub use json::{export_report_json, ReportExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_report_yaml;
