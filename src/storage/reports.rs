//! Report definition repository for JSON storage
//!
//! Manages loading and saving report definitions to reports.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DatabaseId, ReportDefinition, ReportId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReportData {
    reports: Vec<ReportDefinition>,
}

/// Repository for report definition persistence
pub struct ReportRepository {
    path: PathBuf,
    data: RwLock<HashMap<ReportId, ReportDefinition>>,
}

impl ReportRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn lock_error(e: impl std::fmt::Display) -> LedgerError {
        LedgerError::Storage(format!("Failed to acquire report lock: {}", e))
    }

    pub fn load(&self) -> LedgerResult<()> {
        let file_data: ReportData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(Self::lock_error)?;
        data.clear();
        for report in file_data.reports {
            data.insert(report.id, report);
        }

        Ok(())
    }

    pub fn save(&self) -> LedgerResult<()> {
        let data = self.data.read().map_err(Self::lock_error)?;

        let mut reports: Vec<ReportDefinition> = data.values().cloned().collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &ReportData { reports })
    }

    pub fn get(&self, id: ReportId) -> LedgerResult<Option<ReportDefinition>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// All report definitions, sorted by name
    pub fn get_all(&self) -> LedgerResult<Vec<ReportDefinition>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        let mut reports: Vec<ReportDefinition> = data.values().cloned().collect();
        reports.sort_by_key(|r| r.name.to_lowercase());
        Ok(reports)
    }

    /// Reports built over one database, sorted by name
    pub fn get_by_database(&self, database_id: DatabaseId) -> LedgerResult<Vec<ReportDefinition>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|r| r.database_id == database_id)
            .collect())
    }

    /// Find a report by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<ReportDefinition>> {
        let data = self.data.read().map_err(Self::lock_error)?;
        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|r| r.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert(&self, report: ReportDefinition) -> LedgerResult<()> {
        let mut data = self.data.write().map_err(Self::lock_error)?;
        data.insert(report.id, report);
        Ok(())
    }

    pub fn delete(&self, id: ReportId) -> LedgerResult<Option<ReportDefinition>> {
        let mut data = self.data.write().map_err(Self::lock_error)?;
        Ok(data.remove(&id))
    }

    /// Insert or replace one report, re-reading reports.json under the lock
    pub fn commit_upsert(&self, report: ReportDefinition) -> LedgerResult<()> {
        let id = report.id;
        self.commit(|reports| {
            match reports.iter().position(|r| r.id == id) {
                Some(i) => reports[i] = report,
                None => reports.push(report),
            }
            Ok(())
        })?;
        debug!(report_id = %id, "committed report");
        Ok(())
    }

    /// Remove every report matching `predicate`, returning the removed ones
    pub fn commit_remove<P>(&self, predicate: P) -> LedgerResult<Vec<ReportDefinition>>
    where
        P: Fn(&ReportDefinition) -> bool,
    {
        let removed = self.commit(|reports| {
            let (removed, kept): (Vec<_>, Vec<_>) =
                std::mem::take(reports).into_iter().partition(|r| predicate(r));
            *reports = kept;
            Ok(removed)
        })?;
        debug!(removed = removed.len(), "removed reports");
        Ok(removed)
    }

    /// Apply `change` to the reports on disk and write them back atomically
    ///
    /// The in-memory copy is replaced only once the write succeeds.
    fn commit<T, F>(&self, change: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Vec<ReportDefinition>) -> LedgerResult<T>,
    {
        let mut data = self.data.write().map_err(Self::lock_error)?;

        let mut on_disk: ReportData = read_json(&self.path)?;
        let output = change(&mut on_disk.reports)?;
        write_json_atomic(&self.path, &on_disk)?;

        data.clear();
        for report in on_disk.reports {
            data.insert(report.id, report);
        }

        Ok(output)
    }
}
