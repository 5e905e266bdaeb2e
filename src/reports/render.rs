//! Report rendering
//!
//! Projects a database's rows through a report definition: source columns
//! pass values through, formula columns are evaluated per row, and formula
//! rows aggregate each output column. Evaluation failures become null cells;
//! rendering itself never fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formula::Formula;
use crate::models::value::canonical_number;
use crate::models::{CellValue, Database, DatabaseId, ReportColumnKind, ReportDefinition, ReportId, Row};

use super::aggregate::aggregate;

/// Kind of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Source,
    Formula,
}

/// Output column header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedColumn {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// An aggregation row; columns without a function are absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFormulaRow {
    pub label: String,
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub row_count: usize,
    pub database_name: String,
    pub database_id: DatabaseId,
    pub report_id: ReportId,
    pub report_name: String,
}

/// A report evaluated against the current rows of its database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedReport {
    pub columns: Vec<RenderedColumn>,
    /// One map per stored row, keyed by output column key
    pub data_rows: Vec<Row>,
    pub formula_rows: Vec<RenderedFormulaRow>,
    pub metadata: ReportMetadata,
}

/// A column ready to evaluate: source key, or a formula parsed once
enum Projection {
    Source(String),
    Formula(Option<Formula>),
}

impl RenderedReport {
    /// Render `definition` over the rows of `database`
    pub fn generate(definition: &ReportDefinition, database: &Database) -> Self {
        let ordered = definition.ordered_columns();

        let columns: Vec<RenderedColumn> = ordered
            .iter()
            .map(|c| RenderedColumn {
                key: c.key.clone(),
                label: c.label.clone(),
                column_type: match c.kind {
                    ReportColumnKind::Source { .. } => ColumnType::Source,
                    ReportColumnKind::Formula { .. } => ColumnType::Formula,
                },
            })
            .collect();

        let projections: Vec<(&str, Projection)> = ordered
            .iter()
            .map(|c| {
                let projection = match &c.kind {
                    ReportColumnKind::Source { source_column_key } => {
                        Projection::Source(source_column_key.clone())
                    }
                    ReportColumnKind::Formula { expression } => {
                        Projection::Formula(Formula::parse(expression).ok())
                    }
                };
                (c.key.as_str(), projection)
            })
            .collect();

        let data_rows: Vec<Row> = database
            .rows
            .iter()
            .map(|row| {
                projections
                    .iter()
                    .map(|(key, projection)| {
                        let value = match projection {
                            Projection::Source(source) => {
                                row.get(source).cloned().unwrap_or(CellValue::Null)
                            }
                            Projection::Formula(formula) => formula
                                .as_ref()
                                .and_then(|f| f.evaluate_row(row, &database.schema).ok())
                                .map(CellValue::Number)
                                .unwrap_or(CellValue::Null),
                        };
                        (key.to_string(), value)
                    })
                    .collect()
            })
            .collect();

        let formula_rows = definition
            .formula_rows
            .iter()
            .map(|formula_row| RenderedFormulaRow {
                label: formula_row.label.clone(),
                values: formula_row
                    .functions
                    .iter()
                    .map(|(key, function)| {
                        let value = if columns.iter().any(|c| &c.key == key) {
                            aggregate(function, data_rows.iter().filter_map(|r| r.get(key)))
                        } else {
                            None
                        };
                        (key.clone(), value)
                    })
                    .collect(),
            })
            .collect();

        Self {
            columns,
            data_rows,
            formula_rows,
            metadata: ReportMetadata {
                row_count: database.rows.len(),
                database_name: database.name.clone(),
                database_id: database.id,
                report_id: definition.id,
                report_name: definition.name.clone(),
            },
        }
    }

    /// Cells of one data row as display strings, in column order
    pub fn data_cells(&self, row: &Row) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| row.get(&c.key).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }

    /// Cells of one formula row as display strings, in column order
    pub fn formula_cells(&self, formula_row: &RenderedFormulaRow) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| match formula_row.values.get(&c.key) {
                Some(Some(value)) => canonical_number(*value),
                Some(None) => "-".to_string(),
                None => String::new(),
            })
            .collect()
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let label_width = self
            .formula_rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);

        let body: Vec<Vec<String>> = self.data_rows.iter().map(|r| self.data_cells(r)).collect();
        let summary: Vec<(String, Vec<String>)> = self
            .formula_rows
            .iter()
            .map(|r| (r.label.clone(), self.formula_cells(r)))
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                body.iter()
                    .chain(summary.iter().map(|(_, cells)| cells))
                    .map(|cells| cells[i].chars().count())
                    .chain(std::iter::once(c.label.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let total_width = label_width + widths.iter().map(|w| w + 2).sum::<usize>();

        let mut output = String::new();
        output.push_str(&format!(
            "{} - {} ({} rows)\n",
            self.metadata.report_name, self.metadata.database_name, self.metadata.row_count
        ));
        output.push_str(&"=".repeat(total_width.max(20)));
        output.push('\n');

        let line = |lead: &str, cells: &[String]| -> String {
            let mut s = format!("{:<width$}", lead, width = label_width);
            for (cell, width) in cells.iter().zip(&widths) {
                s.push_str(&format!("  {:>width$}", cell, width = width));
            }
            s.trim_end().to_string() + "\n"
        };

        let headers: Vec<String> = self.columns.iter().map(|c| c.label.clone()).collect();
        output.push_str(&line("", &headers));
        output.push_str(&"-".repeat(total_width.max(20)));
        output.push('\n');

        for cells in &body {
            output.push_str(&line("", cells));
        }

        if !summary.is_empty() {
            output.push_str(&"-".repeat(total_width.max(20)));
            output.push('\n');
            for (label, cells) in &summary {
                output.push_str(&line(label, cells));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDefinition, DataType, DatabaseSchema, FormulaRow, ReportColumn};

    fn database() -> Database {
        let schema = DatabaseSchema::new(vec![
            ColumnDefinition::new("item", "Item", DataType::Text),
            ColumnDefinition::new("amt", "Amount", DataType::Currency),
            ColumnDefinition::new("fee", "Fee", DataType::Number),
        ]);
        let mut db = Database::new("Sales", schema);
        let rows = vec![
            [("item", "Widget"), ("amt", "$1,000.00"), ("fee", "25")],
            [("item", "Gadget"), ("amt", "250"), ("fee", "abc")],
            [("item", "Refund"), ("amt", "(100)"), ("fee", "")],
        ]
        .into_iter()
        .map(|pairs| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
                .collect()
        })
        .collect();
        db.set_rows(rows);
        db
    }

    fn definition(db: &Database) -> ReportDefinition {
        ReportDefinition::new(
            "Net sales",
            db.id,
            vec![
                ReportColumn::source("item", "Item", "item").with_order(0),
                ReportColumn::source("amt", "Amount", "amt").with_order(1),
                ReportColumn::formula("net", "Net", "amt - fee").with_order(2),
            ],
            vec![
                FormulaRow::new("Total").with("amt", "SUM").with("net", "sum"),
                FormulaRow::new("Average").with("net", "AVG").with("item", "COUNT"),
            ],
        )
    }

    #[test]
    fn test_source_and_formula_columns() {
        let db = database();
        let report = RenderedReport::generate(&definition(&db), &db);

        assert_eq!(report.columns.len(), 3);
        assert_eq!(report.columns[2].column_type, ColumnType::Formula);
        assert_eq!(report.data_rows[0]["amt"], CellValue::from("$1,000.00"));
        assert_eq!(report.data_rows[0]["net"], CellValue::Number(975.0));
        // non-numeric fee counts as 0
        assert_eq!(report.data_rows[1]["net"], CellValue::Number(250.0));
        assert_eq!(report.data_rows[2]["net"], CellValue::Number(-100.0));
    }

    #[test]
    fn test_formula_rows_aggregate_output_columns() {
        let db = database();
        let report = RenderedReport::generate(&definition(&db), &db);

        let total = &report.formula_rows[0];
        assert_eq!(total.values["amt"], Some(1150.0));
        assert_eq!(total.values["net"], Some(1125.0));

        let average = &report.formula_rows[1];
        assert_eq!(average.values["net"], Some(375.0));
        // text column has no numeric values
        assert_eq!(average.values["item"], None);
    }

    #[test]
    fn test_broken_formula_and_unknown_function_render_null() {
        let db = database();
        let def = ReportDefinition::new(
            "Broken",
            db.id,
            vec![
                ReportColumn::formula("bad", "Bad", "amt ; 1"),
                ReportColumn::formula("div", "Div", "amt / 0"),
                ReportColumn::source("gone", "Gone", "missing_key"),
            ],
            vec![
                FormulaRow::new("Median").with("div", "MEDIAN"),
                FormulaRow::new("Ghost").with("nowhere", "SUM"),
            ],
        );

        let report = RenderedReport::generate(&def, &db);
        assert!(report.data_rows.iter().all(|r| r["bad"] == CellValue::Null));
        assert!(report.data_rows.iter().all(|r| r["div"] == CellValue::Null));
        assert!(report.data_rows.iter().all(|r| r["gone"] == CellValue::Null));
        assert_eq!(report.formula_rows[0].values["div"], None);
        assert_eq!(report.formula_rows[1].values["nowhere"], None);
    }

    #[test]
    fn test_json_shape() {
        let db = database();
        let report = RenderedReport::generate(&definition(&db), &db);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["metadata"]["rowCount"], 3);
        assert_eq!(json["metadata"]["databaseName"], "Sales");
        assert_eq!(json["columns"][2]["type"], "formula");
        assert_eq!(json["dataRows"][0]["net"], 975.0);
        assert_eq!(json["formulaRows"][0]["values"]["amt"], 1150.0);
        assert!(json["dataRows"][0].get("fee").is_none());
    }

    #[test]
    fn test_format_terminal() {
        let db = database();
        let report = RenderedReport::generate(&definition(&db), &db);
        let text = report.format_terminal();

        assert!(text.starts_with("Net sales - Sales (3 rows)"));
        assert!(text.contains("Widget"));
        assert!(text.contains("Total"));
        assert!(text.contains("1150"));
    }

    #[test]
    fn test_empty_database() {
        let mut db = database();
        db.set_rows(Vec::new());
        let report = RenderedReport::generate(&definition(&db), &db);

        assert!(report.data_rows.is_empty());
        assert_eq!(report.formula_rows[0].values["amt"], None);
        assert_eq!(report.metadata.row_count, 0);
    }
}
