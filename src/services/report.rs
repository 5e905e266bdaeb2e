//! Report service
//!
//! Saves report definitions after checking them against the schema of the
//! database they read from, and renders them on demand.

use tracing::{debug, info};

use crate::audit::{generate_diff, EntityType};
use crate::error::{LedgerError, LedgerResult};
use crate::formula::Formula;
use crate::models::{
    Database, DatabaseId, FormulaRow, ReportColumn, ReportColumnKind, ReportDefinition, ReportId,
};
use crate::reports::{AggregateFunction, RenderedReport};
use crate::storage::Storage;

/// Input for creating or replacing a report definition
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub name: String,
    pub description: String,
    pub database_id: DatabaseId,
    pub columns: Vec<ReportColumn>,
    pub formula_rows: Vec<FormulaRow>,
}

/// Service for report definitions
pub struct ReportService<'a> {
    storage: &'a Storage,
}

impl<'a> ReportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a report definition
    pub fn create_report(&self, input: ReportInput) -> LedgerResult<ReportDefinition> {
        let name = input.name.trim();
        if self.name_taken(name, None)? {
            return Err(LedgerError::Duplicate {
                entity_type: "Report",
                identifier: name.to_string(),
            });
        }

        let mut report = ReportDefinition::new(
            name,
            input.database_id,
            input.columns,
            input.formula_rows,
        );
        report.description = input.description.trim().to_string();

        let database = self.database_for(input.database_id)?;
        validate_definition(&report, &database)?;

        self.storage.reports.commit_upsert(report.clone())?;

        info!(
            report_id = %report.id,
            database_id = %report.database_id,
            columns = report.columns.len(),
            "report created"
        );

        self.storage.log_create(
            EntityType::Report,
            report.id.to_string(),
            Some(report.name.clone()),
            &report,
        )?;

        Ok(report)
    }

    /// Replace the name, columns and formula rows of an existing report
    pub fn update_report(&self, id: ReportId, input: ReportInput) -> LedgerResult<ReportDefinition> {
        let existing = self.require(id)?;
        let name = input.name.trim();
        if self.name_taken(name, Some(id))? {
            return Err(LedgerError::Duplicate {
                entity_type: "Report",
                identifier: name.to_string(),
            });
        }

        let mut report = existing.clone();
        report.name = name.to_string();
        report.description = input.description.trim().to_string();
        report.database_id = input.database_id;
        report.columns = input.columns;
        report.formula_rows = input.formula_rows;
        report.updated_at = chrono::Utc::now();

        let database = self.database_for(report.database_id)?;
        validate_definition(&report, &database)?;

        self.storage.reports.commit_upsert(report.clone())?;

        debug!(report_id = %id, "report updated");

        let before = serde_json::to_value(&existing)?;
        let after = serde_json::to_value(&report)?;
        self.storage.log_update(
            EntityType::Report,
            id.to_string(),
            Some(report.name.clone()),
            &before,
            &after,
            generate_diff(&before, &after),
        )?;

        Ok(report)
    }

    pub fn delete_report(&self, id: ReportId) -> LedgerResult<ReportDefinition> {
        let report = self.require(id)?;
        self.storage.reports.commit_remove(|r| r.id == id)?;

        info!(report_id = %id, "report deleted");

        self.storage.log_delete(
            EntityType::Report,
            id.to_string(),
            Some(report.name.clone()),
            &report,
        )?;

        Ok(report)
    }

    pub fn get(&self, id: ReportId) -> LedgerResult<Option<ReportDefinition>> {
        self.storage.reports.get(id)
    }

    /// Get a report or fail with `NotFound`
    pub fn require(&self, id: ReportId) -> LedgerResult<ReportDefinition> {
        self.get(id)?
            .ok_or_else(|| LedgerError::report_not_found(id.to_string()))
    }

    /// Find a report by name, full id, or short display id ("rpt-1a2b3c4d")
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<ReportDefinition>> {
        if let Some(report) = self.storage.reports.get_by_name(identifier)? {
            return Ok(Some(report));
        }

        if let Ok(id) = identifier.parse::<ReportId>() {
            return self.storage.reports.get(id);
        }

        Ok(self
            .storage
            .reports
            .get_all()?
            .into_iter()
            .find(|r| r.id.matches_short(identifier)))
    }

    pub fn list(&self) -> LedgerResult<Vec<ReportDefinition>> {
        self.storage.reports.get_all()
    }

    pub fn list_for_database(&self, database_id: DatabaseId) -> LedgerResult<Vec<ReportDefinition>> {
        self.storage.reports.get_by_database(database_id)
    }

    /// Render a saved report against the current rows of its database
    pub fn render_report(&self, id: ReportId) -> LedgerResult<RenderedReport> {
        let report = self.require(id)?;
        let database = self.database_for(report.database_id)?;

        let rendered = RenderedReport::generate(&report, &database);
        debug!(
            report_id = %id,
            rows = rendered.data_rows.len(),
            formula_rows = rendered.formula_rows.len(),
            "report rendered"
        );

        Ok(rendered)
    }

    fn database_for(&self, id: DatabaseId) -> LedgerResult<Database> {
        self.storage
            .databases
            .get(id)?
            .ok_or_else(|| LedgerError::database_not_found(id.to_string()))
    }

    fn name_taken(&self, name: &str, exclude: Option<ReportId>) -> LedgerResult<bool> {
        Ok(self
            .storage
            .reports
            .get_by_name(name)?
            .is_some_and(|r| Some(r.id) != exclude))
    }
}

/// Check a definition against the database it reads from
///
/// Source columns must name schema keys, formulas must parse and reference
/// only schema keys, and every formula-row function must be a known
/// aggregation over an output column of the report.
pub fn validate_definition(report: &ReportDefinition, database: &Database) -> LedgerResult<()> {
    report
        .validate()
        .map_err(|e| LedgerError::Validation(e.to_string()))?;

    for column in &report.columns {
        match &column.kind {
            ReportColumnKind::Source { source_column_key } => {
                if !database.schema.has_column(source_column_key) {
                    return Err(LedgerError::Validation(format!(
                        "Column '{}' reads unknown source column '{}' of database '{}'",
                        column.key, source_column_key, database.name
                    )));
                }
            }
            ReportColumnKind::Formula { expression } => {
                let formula = Formula::parse(expression)
                    .map_err(|e| LedgerError::Formula(format!("column '{}': {}", column.key, e)))?;
                let unknown = formula
                    .references()
                    .into_iter()
                    .find(|key| !database.schema.has_column(key))
                    .map(str::to_string);
                if let Some(unknown) = unknown {
                    return Err(LedgerError::Formula(format!(
                        "column '{}': unknown column '{}' in formula",
                        column.key, unknown
                    )));
                }
            }
        }
    }

    for formula_row in &report.formula_rows {
        if formula_row.label.trim().is_empty() {
            return Err(LedgerError::Validation("Formula row label cannot be empty".into()));
        }
        for (key, function) in &formula_row.functions {
            if !report.columns.iter().any(|c| &c.key == key) {
                return Err(LedgerError::Validation(format!(
                    "Formula row '{}' aggregates unknown output column '{}'",
                    formula_row.label, key
                )));
            }
            function
                .parse::<AggregateFunction>()
                .map_err(|e| LedgerError::Validation(format!("Formula row '{}': {}", formula_row.label, e)))?;
        }
    }

    Ok(())
}
