//! Storage initialization
//!
//! First-run setup: directories, default settings and empty data files.

use crate::config::{LedgerPaths, Settings};
use crate::error::LedgerError;

use super::file_io::write_json_atomic;

/// Initialize storage for a fresh installation
///
/// Creates the directory layout, writes default settings and empty
/// `databases.json` / `reports.json` files. Existing files are left alone.
/// Returns `true` if anything was created.
pub fn initialize_storage(paths: &LedgerPaths) -> Result<bool, LedgerError> {
    paths.ensure_directories()?;
    let mut created = false;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
        created = true;
    }

    if !paths.databases_file().exists() {
        write_json_atomic(
            paths.databases_file(),
            &serde_json::json!({ "databases": [] }),
        )?;
        created = true;
    }

    if !paths.reports_file().exists() {
        write_json_atomic(paths.reports_file(), &serde_json::json!({ "reports": [] }))?;
        created = true;
    }

    Ok(created)
}
