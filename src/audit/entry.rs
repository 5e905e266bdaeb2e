//! Audit entry data structures
//!
//! An entry records one mutation of a database or report definition, with
//! optional before/after snapshots and a change summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Rows were appended to a database by an import batch
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Import => write!(f, "IMPORT"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Database,
    Report,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Database => write!(f, "Database"),
            EntityType::Report => write!(f, "Report"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    pub entity_id: String,

    /// Database or report name at the time of the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable change summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    /// Entry for a newly created entity
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        snapshot: &T,
    ) -> Self {
        Self {
            after: serde_json::to_value(snapshot).ok(),
            ..Self::new(Operation::Create, entity_type, entity_id, entity_name)
        }
    }

    /// Entry for a modified entity
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> Self {
        Self {
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
            diff_summary,
            ..Self::new(Operation::Update, entity_type, entity_id, entity_name)
        }
    }

    /// Entry for a removed entity
    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        snapshot: &T,
    ) -> Self {
        Self {
            before: serde_json::to_value(snapshot).ok(),
            ..Self::new(Operation::Delete, entity_type, entity_id, entity_name)
        }
    }

    /// Entry for an import batch committed to a database
    ///
    /// The summary carries the counts (added, duplicates skipped, new total).
    pub fn import(
        database_id: impl Into<String>,
        database_name: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            diff_summary: Some(summary.into()),
            ..Self::new(
                Operation::Import,
                EntityType::Database,
                database_id,
                Some(database_name.into()),
            )
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_and_entity_display() {
        assert_eq!(Operation::Import.to_string(), "IMPORT");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
        assert_eq!(EntityType::Database.to_string(), "Database");
        assert_eq!(EntityType::Report.to_string(), "Report");
    }

    #[test]
    fn test_create_and_delete_snapshots() {
        let snapshot = json!({"name": "Expenses", "rowCount": 0});
        let created = AuditEntry::create(
            EntityType::Database,
            "db-1234abcd",
            Some("Expenses".into()),
            &snapshot,
        );
        assert_eq!(created.operation, Operation::Create);
        assert!(created.before.is_none());
        assert_eq!(created.after, Some(snapshot.clone()));

        let deleted = AuditEntry::delete(EntityType::Database, "db-1234abcd", None, &snapshot);
        assert_eq!(deleted.operation, Operation::Delete);
        assert!(deleted.after.is_none());
        assert!(deleted.before.is_some());
    }

    #[test]
    fn test_update_keeps_summary() {
        let entry = AuditEntry::update(
            EntityType::Report,
            "rpt-0badf00d",
            Some("Monthly".into()),
            &json!({"name": "Monthly"}),
            &json!({"name": "Monthly Close"}),
            Some("name: \"Monthly\" -> \"Monthly Close\"".into()),
        );
        assert_eq!(entry.entity_type, EntityType::Report);
        assert!(entry.diff_summary.unwrap().contains("Monthly Close"));
    }

    #[test]
    fn test_import_entry_round_trips() {
        let entry = AuditEntry::import("db-1234abcd", "Expenses", "added 3, skipped 1, total 7");
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains("\"operation\":\"import\""));
        assert!(!line.contains("\"before\""));

        let parsed: AuditEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.operation, Operation::Import);
        assert_eq!(parsed.entity_name.as_deref(), Some("Expenses"));
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::import("db-1234abcd", "Expenses", "added 3");
        let formatted = entry.format_human_readable();
        assert!(formatted.contains("IMPORT Database db-1234abcd (Expenses)"));
        assert!(formatted.contains("Changes: added 3"));
    }
}
