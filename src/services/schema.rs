//! Schema validation at the service boundary

use crate::config::StoreLimits;
use crate::error::{LedgerError, LedgerResult};
use crate::models::DatabaseSchema;

/// Validate a schema against the configured ceilings
///
/// Returns the first violation as a message, or `None` if the schema is
/// acceptable.
pub fn validate_schema(schema: &DatabaseSchema, limits: &StoreLimits) -> Option<String> {
    schema
        .validate(limits.max_columns)
        .err()
        .map(|e| e.to_string())
}

/// [`validate_schema`] as a `LedgerResult`
pub fn ensure_valid_schema(schema: &DatabaseSchema, limits: &StoreLimits) -> LedgerResult<()> {
    match validate_schema(schema, limits) {
        Some(message) => Err(LedgerError::Validation(message)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDefinition, DataType};

    fn column(key: &str, label: &str, data_type: DataType) -> ColumnDefinition {
        ColumnDefinition::new(key, label, data_type)
    }

    #[test]
    fn test_valid_schema() {
        let schema = DatabaseSchema::new(vec![
            column("amt", "Amount", DataType::Currency).required(),
            column("status", "Status", DataType::Dropdown).with_options(["Open", "Closed"]),
        ]);
        assert_eq!(validate_schema(&schema, &StoreLimits::default()), None);
    }

    #[test]
    fn test_rejects_each_violation() {
        let limits = StoreLimits::default();
        let cases = vec![
            vec![column("a", "A", DataType::Text), column("a", "B", DataType::Text)],
            vec![column("a", "Same", DataType::Text), column("b", "same", DataType::Text)],
            vec![column("_id", "Id", DataType::Text)],
            vec![column("a", "A", DataType::Unknown("money".into()))],
            vec![column("a", "A", DataType::Dropdown)],
            vec![column("a", " ", DataType::Text)],
            vec![],
        ];

        for columns in cases {
            let schema = DatabaseSchema::new(columns.clone());
            assert!(
                validate_schema(&schema, &limits).is_some(),
                "accepted {:?}",
                columns
            );
        }
    }

    #[test]
    fn test_column_ceiling_comes_from_limits() {
        let columns: Vec<ColumnDefinition> = (0..5)
            .map(|i| column(&format!("c{}", i), &format!("C{}", i), DataType::Number))
            .collect();
        let schema = DatabaseSchema::new(columns);

        let tight = StoreLimits {
            max_columns: 4,
            ..StoreLimits::default()
        };
        let message = validate_schema(&schema, &tight).unwrap();
        assert!(message.contains("too many columns"));

        assert!(ensure_valid_schema(&schema, &StoreLimits::default()).is_ok());
        assert!(ensure_valid_schema(&schema, &tight).unwrap_err().is_validation());
    }
}
