//! Database repository for JSON storage
//!
//! Manages loading and saving databases (schema plus rows) to databases.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Database, DatabaseId, Row};

use super::file_io::{read_json, write_json_atomic};

/// Serializable database file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DatabaseData {
    databases: Vec<Database>,
}

/// Repository for database persistence
pub struct DatabaseRepository {
    path: PathBuf,
    data: RwLock<HashMap<DatabaseId, Database>>,
}

impl DatabaseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn lock_error(e: impl std::fmt::Display) -> LedgerError {
        LedgerError::Storage(format!("Failed to acquire database lock: {}", e))
    }

    /// Load databases from disk, replacing the in-memory copy
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: DatabaseData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(Self::lock_error)?;
        data.clear();
        for database in file_data.databases {
            data.insert(database.id, database);
        }

        Ok(())
    }

    /// Save databases to disk
    pub fn save(&self) -> LedgerResult<()> {
        let data = self.data.read().map_err(Self::lock_error)?;
        write_json_atomic(&self.path, &Self::file_data(&data))
    }

    fn file_data(data: &HashMap<DatabaseId, Database>) -> DatabaseData {
        let mut databases: Vec<Database> = data.values().cloned().collect();
        databases.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        DatabaseData { databases }
    }

    pub fn get(&self, id: DatabaseId) -> LedgerResult<Option<Database>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// All databases, sorted by name
    pub fn get_all(&self) -> LedgerResult<Vec<Database>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        let mut databases: Vec<Database> = data.values().cloned().collect();
        databases.sort_by_key(|d| d.name.to_lowercase());
        Ok(databases)
    }

    /// Find a database by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<Database>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|d| d.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Check if a name is taken by a database other than `exclude_id`
    pub fn name_exists(&self, name: &str, exclude_id: Option<DatabaseId>) -> LedgerResult<bool> {
        let data = self.data.read().map_err(Self::lock_error)?;
        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .any(|d| d.name.to_lowercase() == name_lower && Some(d.id) != exclude_id))
    }

    pub fn upsert(&self, database: Database) -> LedgerResult<()> {
        let mut data = self.data.write().map_err(Self::lock_error)?;
        data.insert(database.id, database);
        Ok(())
    }

    /// Remove a database, returning it if it existed
    pub fn delete(&self, id: DatabaseId) -> LedgerResult<Option<Database>> {
        let mut data = self.data.write().map_err(Self::lock_error)?;
        Ok(data.remove(&id))
    }

    pub fn count(&self) -> LedgerResult<usize> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.len())
    }

    /// Replace a database's rows inside a re-read-then-write guard
    ///
    /// Holds the write lock, re-reads databases.json so rows committed by
    /// another process since `load` are seen, and hands the fresh database to
    /// `build`. `build` returns the complete new row collection (plus any
    /// value to pass back) or an error that aborts the commit. Rows and row
    /// count are written together in one atomic file replace; the in-memory
    /// copy is only updated once that write succeeds.
    pub fn commit_rows<T, F>(&self, id: DatabaseId, build: F) -> LedgerResult<(Database, T)>
    where
        F: FnOnce(&Database) -> LedgerResult<(Vec<Row>, T)>,
    {
        let mut data = self.data.write().map_err(Self::lock_error)?;

        let mut on_disk: DatabaseData = read_json(&self.path)?;
        let position = on_disk.databases.iter().position(|d| d.id == id);

        let fresh = match position {
            Some(i) => on_disk.databases[i].clone(),
            None => data
                .get(&id)
                .cloned()
                .ok_or_else(|| LedgerError::database_not_found(id.to_string()))?,
        };

        let (rows, output) = build(&fresh)?;

        let mut updated = fresh;
        updated.set_rows(rows);

        match position {
            Some(i) => on_disk.databases[i] = updated.clone(),
            None => on_disk.databases.push(updated.clone()),
        }

        write_json_atomic(&self.path, &on_disk)?;

        debug!(
            database_id = %id,
            row_count = updated.row_count,
            "committed rows"
        );

        Self::refresh(&mut data, on_disk.databases);

        Ok((updated, output))
    }

    /// Store, change or remove one database inside the re-read-then-write guard
    ///
    /// `apply` sees the entry as it is on disk now (`None` if absent) and
    /// returns the entry to store, or `None` to remove it. Every other
    /// database in the file, rows included, is written back as found, so a
    /// stale handle cannot drop rows another handle committed.
    pub fn commit_entry<F>(&self, id: DatabaseId, apply: F) -> LedgerResult<Option<Database>>
    where
        F: FnOnce(Option<&Database>) -> LedgerResult<Option<Database>>,
    {
        let mut data = self.data.write().map_err(Self::lock_error)?;

        let mut on_disk: DatabaseData = read_json(&self.path)?;
        let position = on_disk.databases.iter().position(|d| d.id == id);

        let updated = apply(position.map(|i| &on_disk.databases[i]))?;

        match (position, updated.clone()) {
            (Some(i), Some(database)) => on_disk.databases[i] = database,
            (Some(i), None) => {
                on_disk.databases.remove(i);
            }
            (None, Some(database)) => on_disk.databases.push(database),
            (None, None) => {}
        }

        write_json_atomic(&self.path, &on_disk)?;

        debug!(
            database_id = %id,
            removed = updated.is_none(),
            "committed database"
        );

        Self::refresh(&mut data, on_disk.databases);

        Ok(updated)
    }

    fn refresh(data: &mut HashMap<DatabaseId, Database>, databases: Vec<Database>) {
        data.clear();
        for database in databases {
            data.insert(database.id, database);
        }
    }
}
