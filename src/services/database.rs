//! Database service
//!
//! Lifecycle of user-defined databases: creation with schema validation and
//! an optional initial batch, lookup, renaming, row deletion by identifier
//! key, paging, and deletion (which also removes dependent reports).

use std::collections::HashSet;

use tracing::{debug, info};

use crate::audit::{generate_diff, EntityType};
use crate::config::StoreLimits;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Database, DatabaseId, DatabaseSchema, ReportDefinition, Row};
use crate::storage::Storage;

use super::import::reconcile;
use super::normalize::{composite_key, normalize_key_tuple};
use super::schema::ensure_valid_schema;

/// Input for creating a database
#[derive(Debug, Clone, Default)]
pub struct CreateDatabaseInput {
    pub name: String,
    pub description: String,
    pub schema: DatabaseSchema,
    pub identifier_keys: Vec<String>,
    pub initial_rows: Vec<Row>,
}

/// One page of stored rows
#[derive(Debug, Clone)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub offset: usize,
    pub total: usize,
}

/// A deleted database and the reports removed with it
#[derive(Debug, Clone)]
pub struct DeletedDatabase {
    pub database: Database,
    pub reports: Vec<ReportDefinition>,
}

/// Service for database management
pub struct DatabaseService<'a> {
    storage: &'a Storage,
    limits: StoreLimits,
}

impl<'a> DatabaseService<'a> {
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

    /// Create a database, optionally seeded with an initial batch
    ///
    /// The initial batch goes through the same validation and duplicate
    /// collapsing as an import; any row error blocks creation.
    pub fn create_database(&self, input: CreateDatabaseInput) -> LedgerResult<Database> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Database name cannot be empty".into()));
        }

        if self.storage.databases.name_exists(name, None)? {
            return Err(LedgerError::Duplicate {
                entity_type: "Database",
                identifier: name.to_string(),
            });
        }

        ensure_valid_schema(&input.schema, &self.limits)?;

        let mut database = Database::new(name, input.schema);
        database.description = input.description.trim().to_string();
        database.identifier_keys = input.identifier_keys;
        database
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if !input.initial_rows.is_empty() {
            let seeded = reconcile(&database.schema, &[], &input.initial_rows, &self.limits);
            if !seeded.is_valid() {
                return Err(LedgerError::Validation(format!(
                    "Initial rows rejected: {}",
                    seeded.errors.join("; ")
                )));
            }
            database.set_rows(seeded.new_rows);
        }

        let id = database.id;
        let stored = database.clone();
        self.storage.databases.commit_entry(id, |existing| match existing {
            Some(_) => Err(LedgerError::Duplicate {
                entity_type: "Database",
                identifier: id.to_string(),
            }),
            None => Ok(Some(stored)),
        })?;

        info!(
            database_id = %database.id,
            columns = database.schema.columns.len(),
            rows = database.row_count,
            "database created"
        );

        self.storage.log_create(
            EntityType::Database,
            database.id.to_string(),
            Some(database.name.clone()),
            &database.audit_snapshot(),
        )?;

        Ok(database)
    }

    pub fn get(&self, id: DatabaseId) -> LedgerResult<Option<Database>> {
        self.storage.databases.get(id)
    }

    /// Get a database or fail with `NotFound`
    pub fn require(&self, id: DatabaseId) -> LedgerResult<Database> {
        self.get(id)?
            .ok_or_else(|| LedgerError::database_not_found(id.to_string()))
    }

    /// Find a database by name, full id, or short display id ("db-1a2b3c4d")
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Database>> {
        if let Some(database) = self.storage.databases.get_by_name(identifier)? {
            return Ok(Some(database));
        }

        if let Ok(id) = identifier.parse::<DatabaseId>() {
            return self.storage.databases.get(id);
        }

        Ok(self
            .storage
            .databases
            .get_all()?
            .into_iter()
            .find(|d| d.id.matches_short(identifier)))
    }

    /// All databases sorted by name
    pub fn list(&self) -> LedgerResult<Vec<Database>> {
        self.storage.databases.get_all()
    }

    pub fn rename(&self, id: DatabaseId, new_name: &str) -> LedgerResult<Database> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LedgerError::Validation("Database name cannot be empty".into()));
        }
        if self.storage.databases.name_exists(new_name, Some(id))? {
            return Err(LedgerError::Duplicate {
                entity_type: "Database",
                identifier: new_name.to_string(),
            });
        }

        self.update_metadata(id, |database| {
            database.rename(new_name);
            database
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))
        })
    }

    pub fn update_description(&self, id: DatabaseId, description: &str) -> LedgerResult<Database> {
        self.update_metadata(id, |database| {
            database.description = description.trim().to_string();
            database.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    /// Change name or description on the stored entry, leaving its rows as
    /// they are on disk
    fn update_metadata<F>(&self, id: DatabaseId, change: F) -> LedgerResult<Database>
    where
        F: FnOnce(&mut Database) -> LedgerResult<()>,
    {
        let mut before = serde_json::Value::Null;
        let database = self
            .storage
            .databases
            .commit_entry(id, |fresh| {
                let mut database = fresh
                    .cloned()
                    .ok_or_else(|| LedgerError::database_not_found(id.to_string()))?;
                before = database.audit_snapshot();
                change(&mut database)?;
                Ok(Some(database))
            })?
            .ok_or_else(|| LedgerError::database_not_found(id.to_string()))?;

        let after = database.audit_snapshot();
        self.storage.log_update(
            EntityType::Database,
            database.id.to_string(),
            Some(database.name.clone()),
            &before,
            &after,
            generate_diff(&before, &after),
        )?;

        Ok(database)
    }

    /// Delete a database and every report built over it
    pub fn delete_database(&self, id: DatabaseId) -> LedgerResult<DeletedDatabase> {
        let mut removed = None;
        self.storage.databases.commit_entry(id, |fresh| {
            removed = Some(
                fresh
                    .cloned()
                    .ok_or_else(|| LedgerError::database_not_found(id.to_string()))?,
            );
            Ok(None)
        })?;
        let database = removed.ok_or_else(|| LedgerError::database_not_found(id.to_string()))?;

        let reports = self
            .storage
            .reports
            .commit_remove(|r| r.database_id == id)?;

        info!(
            database_id = %id,
            reports_removed = reports.len(),
            "database deleted"
        );

        self.storage.log_delete(
            EntityType::Database,
            id.to_string(),
            Some(database.name.clone()),
            &database.audit_snapshot(),
        )?;
        for report in &reports {
            self.storage.log_delete(
                EntityType::Report,
                report.id.to_string(),
                Some(report.name.clone()),
                report,
            )?;
        }

        Ok(DeletedDatabase { database, reports })
    }

    /// Delete rows whose identifier-key values match one of `key_tuples`
    ///
    /// Each tuple lists values in the order of the database's identifier
    /// keys. Values are normalized like stored cells, so `"$50"` matches a
    /// stored `"50.00"`. Returns the number of rows removed.
    pub fn delete_rows(&self, id: DatabaseId, key_tuples: &[Vec<String>]) -> LedgerResult<usize> {
        let database = self.require(id)?;

        if database.identifier_keys.is_empty() {
            return Err(LedgerError::Validation(format!(
                "Database '{}' has no identifier keys; rows cannot be addressed for deletion",
                database.name
            )));
        }

        let arity = database.identifier_keys.len();
        if let Some(bad) = key_tuples.iter().find(|t| t.len() != arity) {
            return Err(LedgerError::Validation(format!(
                "Key tuple has {} values but the database has {} identifier keys",
                bad.len(),
                arity
            )));
        }

        if key_tuples.is_empty() {
            return Ok(0);
        }

        let (updated, removed) = self.storage.databases.commit_rows(id, |fresh| {
            let targets: HashSet<Vec<String>> = key_tuples
                .iter()
                .map(|t| normalize_key_tuple(t, &fresh.identifier_keys, &fresh.schema))
                .collect();

            let kept: Vec<Row> = fresh
                .rows
                .iter()
                .filter(|row| {
                    !targets.contains(&composite_key(row, &fresh.identifier_keys, &fresh.schema))
                })
                .cloned()
                .collect();

            let removed = fresh.rows.len() - kept.len();
            Ok((kept, removed))
        })?;

        debug!(database_id = %id, removed, row_count = updated.row_count, "rows deleted");

        if removed > 0 {
            let before = database.audit_snapshot();
            let after = updated.audit_snapshot();
            self.storage.log_update(
                EntityType::Database,
                id.to_string(),
                Some(updated.name.clone()),
                &before,
                &after,
                Some(format!("deleted {} rows", removed)),
            )?;
        }

        Ok(removed)
    }

    /// A page of stored rows in insertion order
    pub fn query_rows(&self, id: DatabaseId, offset: usize, limit: usize) -> LedgerResult<RowPage> {
        let database = self.require(id)?;
        let total = database.rows.len();
        let rows = database.rows.into_iter().skip(offset).take(limit).collect();

        Ok(RowPage {
            rows,
            offset,
            total,
        })
    }
}
