//! Report formatting utilities for terminal output

use crate::models::{Database, ReportColumnKind, ReportDefinition};

/// Format a separator line
pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

/// Format a double separator line
pub fn double_separator(width: usize) -> String {
    "═".repeat(width)
}

/// Format report definitions as a table, naming each one's database
pub fn format_report_list(reports: &[ReportDefinition], databases: &[Database]) -> String {
    if reports.is_empty() {
        return "No reports found.".to_string();
    }

    let name_width = reports
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<13}  {:<name_width$}  {:>7}  {}\n",
        "ID",
        "Name",
        "Columns",
        "Database",
        name_width = name_width,
    ));

    for report in reports {
        let database = databases
            .iter()
            .find(|d| d.id == report.database_id)
            .map(|d| d.name.as_str())
            .unwrap_or("(missing)");
        output.push_str(&format!(
            "{:<13}  {:<name_width$}  {:>7}  {}\n",
            report.id.to_string(),
            report.name,
            report.columns.len(),
            database,
            name_width = name_width,
        ));
    }

    output
}

/// Format a report definition's columns and formula rows
pub fn format_report_definition(report: &ReportDefinition) -> String {
    let mut output = String::new();
    output.push_str(&format!("Report: {}\n", report.name));
    output.push_str(&format!("  ID:       {}\n", report.id));
    output.push_str(&format!("  Database: {}\n", report.database_id));
    if !report.description.is_empty() {
        output.push_str(&format!("  About:    {}\n", report.description));
    }

    output.push_str("\nColumns:\n");
    for column in report.ordered_columns() {
        let source = match &column.kind {
            ReportColumnKind::Source { source_column_key } => format!("= {}", source_column_key),
            ReportColumnKind::Formula { expression } => format!("= {}  (formula)", expression),
        };
        output.push_str(&format!("  {:<16} {:<20} {}\n", column.key, column.label, source));
    }

    if !report.formula_rows.is_empty() {
        output.push_str("\nFormula rows:\n");
        for row in &report.formula_rows {
            let functions: Vec<String> = row
                .functions
                .iter()
                .map(|(key, function)| format!("{}({})", function.to_uppercase(), key))
                .collect();
            output.push_str(&format!("  {:<16} {}\n", row.label, functions.join(", ")));
        }
    }

    output
}
