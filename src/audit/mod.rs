//! Audit logging for ledgerdesk
//!
//! Every mutation of a database or report definition (create, update,
//! delete, import) is appended to `audit.log` as one JSON line.
//!
//! ```rust,ignore
//! use ledgerdesk::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! let diff = generate_diff(&before_json, &after_json);
//! logger.log(&AuditEntry::update(
//!     EntityType::Report,
//!     report.id.to_string(),
//!     Some(report.name.clone()),
//!     &before_json,
//!     &after_json,
//!     diff,
//! ))?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
