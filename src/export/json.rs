//! JSON Export functionality
//!
//! Exports a rendered report with schema versioning. The report's own
//! fields (`columns`, `dataRows`, `formulaRows`, `metadata`) sit at the top
//! level next to the export header.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::reports::RenderedReport;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A rendered report wrapped with export metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    #[serde(flatten)]
    pub report: RenderedReport,
}

impl ReportExport {
    pub fn new(report: &RenderedReport) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            report: report.clone(),
        }
    }

    /// Check that an export was written by a compatible version
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        if self.report.data_rows.len() != self.report.metadata.row_count {
            return Err(format!(
                "Export lists {} rows but its metadata says {}",
                self.report.data_rows.len(),
                self.report.metadata.row_count
            ));
        }

        Ok(())
    }
}

/// Export a rendered report to pretty-printed JSON
pub fn export_report_json<W: Write>(report: &RenderedReport, writer: &mut W) -> LedgerResult<()> {
    let export = ReportExport::new(report);
    serde_json::to_writer_pretty(&mut *writer, &export)
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| LedgerError::Export(e.to_string()))?;
    Ok(())
}

/// Read back a JSON export
pub fn import_report_json(json_str: &str) -> LedgerResult<ReportExport> {
    let export: ReportExport =
        serde_json::from_str(json_str).map_err(|e| LedgerError::Import(e.to_string()))?;
    export.validate().map_err(LedgerError::Import)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CellValue, ColumnDefinition, DataType, Database, DatabaseSchema, FormulaRow, ReportColumn,
        ReportDefinition, Row,
    };

    fn rendered() -> RenderedReport {
        let schema = DatabaseSchema::new(vec![ColumnDefinition::new("qty", "Qty", DataType::Number)]);
        let mut db = Database::new("Stock", schema);
        let rows: Vec<Row> = ["3", "4"]
            .iter()
            .map(|q| {
                let mut row = Row::new();
                row.insert("qty".into(), CellValue::from(*q));
                row
            })
            .collect();
        db.set_rows(rows);

        let definition = ReportDefinition::new(
            "Stock levels",
            db.id,
            vec![ReportColumn::source("qty", "Qty", "qty")],
            vec![FormulaRow::new("Total").with("qty", "SUM")],
        );
        RenderedReport::generate(&definition, &db)
    }

    #[test]
    fn test_export_report_json() {
        let mut output = Vec::new();
        export_report_json(&rendered(), &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["schemaVersion"], EXPORT_SCHEMA_VERSION);
        assert_eq!(value["metadata"]["rowCount"], 2);
        assert_eq!(value["dataRows"][1]["qty"], "4");
        assert_eq!(value["formulaRows"][0]["values"]["qty"], 7.0);
    }

    #[test]
    fn test_round_trip_and_version_check() {
        let report = rendered();
        let mut output = Vec::new();
        export_report_json(&report, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        let export = import_report_json(&text).unwrap();
        assert_eq!(export.report, report);

        let tampered = text.replace(EXPORT_SCHEMA_VERSION, "0.1.0");
        assert!(import_report_json(&tampered).is_err());
    }
}
