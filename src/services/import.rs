//! Row import service
//!
//! Parses CSV/JSON input into rows, previews an import against a database,
//! and commits it. Imports are all-or-nothing: any required-field, type or
//! capacity error rejects the whole batch.
//!
//! Duplicate policy is whole-row equality after normalization:
//! - a row equal to an earlier row of the same batch is collapsed (kept once,
//!   reported as a warning)
//! - a row equal to a stored row is an exact duplicate and silently skipped
//! - every other row is appended

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::StoreLimits;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{CellValue, Database, DatabaseId, DatabaseSchema, Row};
use crate::storage::Storage;

use super::normalize::row_key;

/// Rows parsed from a CSV file
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub rows: Vec<Row>,
    /// Header problems that did not stop parsing
    pub warnings: Vec<String>,
}

/// Outcome of checking a batch against a database, without writing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub new_row_count: usize,
    pub exact_duplicate_count: usize,
    pub in_batch_duplicate_count: usize,
    pub existing_row_count: usize,
    pub total_after_import: usize,
}

/// Outcome of a committed (or rejected) import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub added: usize,
    pub exact_duplicates: usize,
    pub in_batch_duplicates: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Rows stored after the import
    pub row_count: usize,
}

/// A batch checked against an existing row collection
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Rows to append, in batch order, restricted to schema columns
    pub new_rows: Vec<Row>,
    pub exact_duplicates: usize,
    pub in_batch_duplicates: usize,
    pub existing_rows: usize,
}

impl Reconciliation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_after_import(&self) -> usize {
        self.existing_rows + self.new_rows.len()
    }

    fn into_preview(self) -> ImportPreview {
        ImportPreview {
            valid: self.is_valid(),
            new_row_count: self.new_rows.len(),
            exact_duplicate_count: self.exact_duplicates,
            in_batch_duplicate_count: self.in_batch_duplicates,
            existing_row_count: self.existing_rows,
            total_after_import: self.total_after_import(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Validate and deduplicate `batch` against `existing` under `limits`
///
/// Row numbers in messages are 1-based positions in the batch.
pub fn reconcile(
    schema: &DatabaseSchema,
    existing: &[Row],
    batch: &[Row],
    limits: &StoreLimits,
) -> Reconciliation {
    let mut result = Reconciliation {
        existing_rows: existing.len(),
        ..Reconciliation::default()
    };

    let mut unknown_keys = BTreeSet::new();
    let mut accepted = Vec::with_capacity(batch.len());

    for (index, row) in batch.iter().enumerate() {
        let row_number = index + 1;
        let mut row_ok = true;
        let mut stored = Row::new();

        for key in row.keys().filter(|k| !schema.has_column(k)) {
            unknown_keys.insert(key.clone());
        }

        for column in schema.ordered_columns() {
            let value = row.get(&column.key).unwrap_or(&CellValue::Null);

            if value.is_empty() {
                if column.required {
                    result
                        .errors
                        .push(format!("Row {}: '{}' is required", row_number, column.label));
                    row_ok = false;
                }
            } else if let Err(message) = column.coerce(value) {
                result.errors.push(format!("Row {}: {}", row_number, message));
                row_ok = false;
            }

            if row.contains_key(&column.key) {
                stored.insert(column.key.clone(), value.clone());
            }
        }

        if row_ok {
            accepted.push((row_number, stored));
        }
    }

    for key in unknown_keys {
        result
            .warnings
            .push(format!("Ignoring unknown column '{}'", key));
    }

    let existing_keys: HashSet<String> = existing.iter().map(|r| row_key(r, schema)).collect();
    let mut batch_keys: HashMap<String, usize> = HashMap::new();

    for (row_number, row) in accepted {
        let key = row_key(&row, schema);

        if let Some(first) = batch_keys.get(&key) {
            result.in_batch_duplicates += 1;
            result.warnings.push(format!(
                "Row {} duplicates row {} of this batch and will be skipped",
                row_number, first
            ));
            continue;
        }
        batch_keys.insert(key.clone(), row_number);

        if existing_keys.contains(&key) {
            result.exact_duplicates += 1;
        } else {
            result.new_rows.push(row);
        }
    }

    if result.total_after_import() > limits.max_rows {
        result.errors.push(format!(
            "Import would exceed the {} row limit ({} existing + {} new = {})",
            format_count(limits.max_rows),
            format_count(result.existing_rows),
            format_count(result.new_rows.len()),
            format_count(result.total_after_import())
        ));
    }

    result
}

/// Format a count with comma thousands separators
fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Service for importing rows into databases
pub struct ImportService<'a> {
    storage: &'a Storage,
    limits: StoreLimits,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            limits: StoreLimits::default(),
        }
    }

    /// Use non-default capacity ceilings
    pub fn with_limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse CSV with a header row into rows keyed by column key
    ///
    /// Headers match a column key or label, case-insensitively. Unmatched
    /// headers are dropped with a warning; empty cells become null.
    pub fn parse_csv_rows<R: Read>(&self, reader: R, schema: &DatabaseSchema) -> LedgerResult<ParsedRows> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut parsed = ParsedRows::default();
        let mut mapped_keys = HashSet::new();
        let mut mapping: Vec<Option<String>> = Vec::with_capacity(headers.len());

        for header in headers.iter() {
            let column = schema.columns.iter().find(|c| {
                c.key.eq_ignore_ascii_case(header) || c.label.trim().eq_ignore_ascii_case(header)
            });

            match column {
                Some(column) if mapped_keys.insert(column.key.clone()) => {
                    mapping.push(Some(column.key.clone()));
                }
                Some(column) => {
                    parsed.warnings.push(format!(
                        "Header '{}' maps to column '{}' more than once; later copies are ignored",
                        header, column.key
                    ));
                    mapping.push(None);
                }
                None => {
                    parsed.warnings.push(format!(
                        "Header '{}' does not match any column and will be ignored",
                        header
                    ));
                    mapping.push(None);
                }
            }
        }

        for record in csv_reader.records() {
            let record = record?;
            let mut row = Row::new();
            for (key, cell) in mapping.iter().zip(record.iter()) {
                if let Some(key) = key {
                    let value = if cell.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::from(cell)
                    };
                    row.insert(key.clone(), value);
                }
            }
            parsed.rows.push(row);
        }

        debug!(rows = parsed.rows.len(), "parsed csv rows");
        Ok(parsed)
    }

    /// Parse a JSON array of flat objects
    pub fn parse_json_rows<R: Read>(&self, reader: R) -> LedgerResult<Vec<Row>> {
        serde_json::from_reader(reader).map_err(|e| {
            LedgerError::Import(format!(
                "Expected a JSON array of objects with scalar values: {}",
                e
            ))
        })
    }

    fn database(&self, id: DatabaseId) -> LedgerResult<Database> {
        self.storage
            .databases
            .get(id)?
            .ok_or_else(|| LedgerError::database_not_found(id.to_string()))
    }

    /// Check a batch against a database without writing anything
    pub fn preview_import(&self, database_id: DatabaseId, rows: &[Row]) -> LedgerResult<ImportPreview> {
        let database = self.database(database_id)?;
        let preview = reconcile(&database.schema, &database.rows, rows, &self.limits).into_preview();

        debug!(
            database_id = %database_id,
            valid = preview.valid,
            new_rows = preview.new_row_count,
            exact_duplicates = preview.exact_duplicate_count,
            "import preview"
        );
        Ok(preview)
    }

    /// Validate, deduplicate and append a batch
    ///
    /// Validation failures come back as an unsuccessful [`ImportResult`];
    /// only a missing database or a storage failure is an `Err`.
    pub fn import_rows(&self, database_id: DatabaseId, rows: &[Row]) -> LedgerResult<ImportResult> {
        let database = self.database(database_id)?;

        // cheap rejection before taking the commit path
        let check = reconcile(&database.schema, &database.rows, rows, &self.limits);
        if !check.is_valid() {
            warn!(
                database_id = %database_id,
                errors = check.errors.len(),
                "import rejected"
            );
            return Ok(rejected(check.errors, check.warnings, database.row_count));
        }

        if check.new_rows.is_empty() {
            info!(
                database_id = %database_id,
                exact_duplicates = check.exact_duplicates,
                in_batch_duplicates = check.in_batch_duplicates,
                "import had nothing new"
            );
            return Ok(ImportResult {
                success: true,
                added: 0,
                exact_duplicates: check.exact_duplicates,
                in_batch_duplicates: check.in_batch_duplicates,
                errors: Vec::new(),
                warnings: check.warnings,
                row_count: database.row_count,
            });
        }

        let limits = self.limits;
        let commit = self.storage.databases.commit_rows(database_id, |fresh| {
            // rows may have landed since the check above
            let reconciled = reconcile(&fresh.schema, &fresh.rows, rows, &limits);
            if !reconciled.is_valid() {
                return Err(LedgerError::Import(reconciled.errors.join("; ")));
            }

            let mut all_rows = fresh.rows.clone();
            all_rows.extend(reconciled.new_rows.iter().cloned());
            Ok((all_rows, reconciled))
        });

        let (updated, reconciled) = match commit {
            Ok(committed) => committed,
            Err(LedgerError::Import(message)) => {
                warn!(database_id = %database_id, %message, "import rejected at commit");
                let current = self.database(database_id)?.row_count;
                return Ok(rejected(vec![message], check.warnings, current));
            }
            Err(e) => return Err(e),
        };

        let result = ImportResult {
            success: true,
            added: reconciled.new_rows.len(),
            exact_duplicates: reconciled.exact_duplicates,
            in_batch_duplicates: reconciled.in_batch_duplicates,
            errors: Vec::new(),
            warnings: reconciled.warnings,
            row_count: updated.row_count,
        };

        info!(
            database_id = %database_id,
            added = result.added,
            exact_duplicates = result.exact_duplicates,
            in_batch_duplicates = result.in_batch_duplicates,
            row_count = result.row_count,
            "import committed"
        );

        self.storage.log_import(
            updated.id.to_string(),
            updated.name.clone(),
            format!(
                "added {}, skipped {} existing and {} in-batch duplicates, {} rows total",
                result.added, result.exact_duplicates, result.in_batch_duplicates, result.row_count
            ),
        )?;

        Ok(result)
    }
}

fn rejected(errors: Vec<String>, warnings: Vec<String>, row_count: usize) -> ImportResult {
    ImportResult {
        success: false,
        errors,
        warnings,
        row_count,
        ..ImportResult::default()
    }
}
