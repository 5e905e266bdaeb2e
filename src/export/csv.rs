//! CSV Export functionality
//!
//! The first column, `Summary`, is empty on data rows and carries the label
//! of each formula row, so the sheet stays rectangular.

use std::io::Write;

use crate::error::{LedgerError, LedgerResult};
use crate::reports::RenderedReport;

/// Export a rendered report to CSV
pub fn export_report_csv<W: Write>(report: &RenderedReport, writer: &mut W) -> LedgerResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["Summary".to_string()];
    header.extend(report.columns.iter().map(|c| c.label.clone()));
    csv_writer
        .write_record(&header)
        .map_err(|e| LedgerError::Export(e.to_string()))?;

    for row in &report.data_rows {
        let mut record = vec![String::new()];
        record.extend(report.data_cells(row));
        csv_writer
            .write_record(&record)
            .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    for formula_row in &report.formula_rows {
        let mut record = vec![formula_row.label.clone()];
        record.extend(
            report
                .formula_cells(formula_row)
                .into_iter()
                .map(|cell| if cell == "-" { String::new() } else { cell }),
        );
        csv_writer
            .write_record(&record)
            .map_err(|e| LedgerError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CellValue, ColumnDefinition, DataType, Database, DatabaseSchema, FormulaRow, ReportColumn,
        ReportDefinition, Row,
    };

    fn rendered() -> RenderedReport {
        let schema = DatabaseSchema::new(vec![
            ColumnDefinition::new("client", "Client", DataType::Text),
            ColumnDefinition::new("amount", "Amount", DataType::Currency),
        ]);
        let mut db = Database::new("Invoices", schema);
        let rows: Vec<Row> = [("Acme, Inc.", "$1,000.00"), ("Globex", "250")]
            .iter()
            .map(|(client, amount)| {
                let mut row = Row::new();
                row.insert("client".into(), CellValue::from(*client));
                row.insert("amount".into(), CellValue::from(*amount));
                row
            })
            .collect();
        db.set_rows(rows);

        let definition = ReportDefinition::new(
            "Billing",
            db.id,
            vec![
                ReportColumn::source("client", "Client", "client").with_order(0),
                ReportColumn::formula("double", "Doubled", "amount * 2").with_order(1),
            ],
            vec![
                FormulaRow::new("Total").with("double", "SUM"),
                FormulaRow::new("Lowest").with("double", "MIN").with("client", "MAX"),
            ],
        );
        RenderedReport::generate(&definition, &db)
    }

    #[test]
    fn test_export_report_csv() {
        let mut output = Vec::new();
        export_report_csv(&rendered(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Summary,Client,Doubled");
        assert_eq!(lines[1], ",\"Acme, Inc.\",2000");
        assert_eq!(lines[2], ",Globex,500");
        assert_eq!(lines[3], "Total,,2500");
        // client has no numeric values, so its MAX is blank
        assert_eq!(lines[4], "Lowest,,500");
        assert_eq!(lines.len(), 5);
    }
}
