//! User settings for ledgerdesk
//!
//! Manages capacity ceilings, audit logging and display preferences.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;

/// Default ceiling on rows stored in a single database
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Default ceiling on columns declared by a single schema
pub const DEFAULT_MAX_COLUMNS: usize = 100;

/// Capacity ceilings enforced by the schema validator and the import reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Maximum rows a database may hold after an import
    pub max_rows: usize,
    /// Maximum columns a schema may declare
    pub max_columns: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

/// User settings for ledgerdesk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Row ceiling per database
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Column ceiling per schema
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,

    /// Whether create/update/delete/import events are written to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,

    /// Fallback tracing filter when LEDGERDESK_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of rows the CLI shows in previews and `db show`
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_schema_version() -> u32 {
    1
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_max_columns() -> usize {
    DEFAULT_MAX_COLUMNS
}

fn default_audit_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_preview_rows() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            max_rows: default_max_rows(),
            max_columns: default_max_columns(),
            audit_enabled: default_audit_enabled(),
            log_level: default_log_level(),
            preview_rows: default_preview_rows(),
        }
    }
}

impl Settings {
    /// Capacity ceilings derived from these settings
    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_rows: self.max_rows,
            max_columns: self.max_columns,
        }
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
