//! Storage layer for ledgerdesk
//!
//! JSON file storage with atomic writes, plus the audit log. Databases
//! (schema and rows) live in `data/databases.json`, report definitions in
//! `data/reports.json`.

pub mod databases;
pub mod file_io;
pub mod init;
pub mod reports;

pub use databases::DatabaseRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use reports::ReportRepository;

use serde::Serialize;
use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::{LedgerPaths, Settings};
use crate::error::LedgerError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerPaths,
    pub databases: DatabaseRepository,
    pub reports: ReportRepository,
    audit: AuditLogger,
    audit_enabled: bool,
}

impl Storage {
    /// Create a new Storage instance with auditing enabled
    pub fn new(paths: LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            databases: DatabaseRepository::new(paths.databases_file()),
            reports: ReportRepository::new(paths.reports_file()),
            audit: AuditLogger::new(paths.audit_log()),
            audit_enabled: true,
            paths,
        })
    }

    /// Open storage honoring the user's settings and load everything
    pub fn open(paths: LedgerPaths, settings: &Settings) -> Result<Self, LedgerError> {
        let mut storage = Self::new(paths)?;
        storage.audit_enabled = settings.audit_enabled;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), LedgerError> {
        self.databases.load()?;
        self.reports.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), LedgerError> {
        self.databases.save()?;
        self.reports.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    fn write_audit(&self, entry: AuditEntry) -> Result<(), LedgerError> {
        if !self.audit_enabled {
            return Ok(());
        }
        self.audit.log(&entry).map_err(|e| {
            warn!(error = %e, "audit write failed");
            e
        })
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        snapshot: &T,
    ) -> Result<(), LedgerError> {
        self.write_audit(AuditEntry::create(entity_type, entity_id, entity_name, snapshot))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Result<(), LedgerError> {
        self.write_audit(AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        snapshot: &T,
    ) -> Result<(), LedgerError> {
        self.write_audit(AuditEntry::delete(entity_type, entity_id, entity_name, snapshot))
    }

    pub fn log_import(
        &self,
        database_id: String,
        database_name: String,
        summary: String,
    ) -> Result<(), LedgerError> {
        self.write_audit(AuditEntry::import(database_id, database_name, summary))
    }
}
