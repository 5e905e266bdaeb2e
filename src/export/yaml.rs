//! YAML Export functionality

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};
use crate::export::json::ReportExport;
use crate::reports::RenderedReport;

/// Export a rendered report to YAML
pub fn export_report_yaml<W: Write>(report: &RenderedReport, writer: &mut W) -> LedgerResult<()> {
    let export = ReportExport::new(report);

    writeln!(
        writer,
        "# ledgerdesk report export: {}",
        export.report.metadata.report_name
    )
    .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer, "# App Version: {}", export.app_version)
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| LedgerError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| LedgerError::Export(e.to_string()))?;

    Ok(())
}
