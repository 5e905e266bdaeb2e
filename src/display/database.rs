//! Database display formatting
//!
//! Formats databases for terminal output in table and detail views, plus a
//! plain table of stored rows.

use crate::models::{Database, ReportDefinition};
use crate::services::RowPage;

use super::report::separator;

/// Format a list of databases as a table
pub fn format_database_list(databases: &[Database]) -> String {
    if databases.is_empty() {
        return "No databases found.".to_string();
    }

    let name_width = databases
        .iter()
        .map(|d| d.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:>7}  {:>6}  {}\n",
        "ID",
        "Name",
        "Columns",
        "Rows",
        "Updated",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:->7}  {:->6}  {:-<16}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for database in databases {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:>7}  {:>6}  {}\n",
            database.id.to_string(),
            database.name,
            database.schema.columns.len(),
            database.row_count,
            database.updated_at.format("%Y-%m-%d %H:%M"),
            name_width = name_width,
        ));
    }

    output
}

/// Format a single database's schema and dependent reports
pub fn format_database_details(database: &Database, reports: &[ReportDefinition]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Database: {}\n", database.name));
    output.push_str(&format!("  ID:             {}\n", database.id));
    if !database.description.is_empty() {
        output.push_str(&format!("  Description:    {}\n", database.description));
    }
    output.push_str(&format!("  Rows:           {}\n", database.row_count));
    output.push_str(&format!("  Schema version: {}\n", database.schema.version));
    if !database.identifier_keys.is_empty() {
        output.push_str(&format!(
            "  Identifier:     {}\n",
            database.identifier_keys.join(", ")
        ));
    }
    output.push_str(&format!(
        "  Created:        {}\n",
        database.created_at.format("%Y-%m-%d %H:%M")
    ));

    output.push('\n');
    output.push_str("Columns:\n");
    for column in database.schema.ordered_columns() {
        let mut flags = Vec::new();
        if column.required {
            flags.push("required".to_string());
        }
        if !column.options.is_empty() {
            flags.push(format!("options: {}", column.options.join(" | ")));
        }
        output.push_str(&format!(
            "  {:<16} {:<20} {:<9} {}\n",
            column.key,
            column.label,
            column.data_type.as_str(),
            flags.join(", ")
        ));
    }

    if !reports.is_empty() {
        output.push('\n');
        output.push_str("Reports:\n");
        for report in reports {
            output.push_str(&format!("  {}  {}\n", report.id, report.name));
        }
    }

    output
}

/// Format one page of rows with schema labels as headers
pub fn format_rows(database: &Database, page: &RowPage) -> String {
    if page.rows.is_empty() {
        return format!("No rows (total {}).", page.total);
    }

    let columns = database.schema.ordered_columns();
    let cells: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(&c.key).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = w))
            .collect();
        padded.join("  ").trim_end().to_string() + "\n"
    };

    let mut output = String::new();
    output.push_str(&line(columns.iter().map(|c| c.label.as_str()).collect()));
    output.push_str(&separator(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    output.push('\n');
    for row in &cells {
        output.push_str(&line(row.iter().map(String::as_str).collect()));
    }

    let shown_to = page.offset + page.rows.len();
    output.push_str(&format!(
        "\nRows {}-{} of {}\n",
        page.offset + 1,
        shown_to,
        page.total
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, ColumnDefinition, DataType, DatabaseSchema, Row};

    fn database() -> Database {
        let mut db = Database::new(
            "Invoices",
            DatabaseSchema::new(vec![
                ColumnDefinition::new("invoice", "Invoice", DataType::Text)
                    .required()
                    .with_order(0),
                ColumnDefinition::new("status", "Status", DataType::Dropdown)
                    .with_options(["Open", "Paid"])
                    .with_order(1),
            ]),
        );
        db.identifier_keys = vec!["invoice".into()];
        let mut row = Row::new();
        row.insert("invoice".into(), CellValue::from("A-1"));
        row.insert("status".into(), CellValue::from("Open"));
        db.set_rows(vec![row]);
        db
    }

    #[test]
    fn test_format_database_list() {
        assert_eq!(format_database_list(&[]), "No databases found.");

        let output = format_database_list(&[database()]);
        assert!(output.contains("Invoices"));
        assert!(output.contains("Columns"));
    }

    #[test]
    fn test_format_database_details() {
        let output = format_database_details(&database(), &[]);
        assert!(output.contains("Database: Invoices"));
        assert!(output.contains("Identifier:     invoice"));
        assert!(output.contains("options: Open | Paid"));
        assert!(output.contains("required"));
    }

    #[test]
    fn test_format_rows() {
        let db = database();
        let page = RowPage {
            rows: db.rows.clone(),
            offset: 0,
            total: 1,
        };
        let output = format_rows(&db, &page);
        assert!(output.starts_with("Invoice  Status"));
        assert!(output.contains("A-1"));
        assert!(output.contains("Rows 1-1 of 1"));
    }
}
