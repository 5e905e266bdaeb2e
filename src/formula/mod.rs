//! Formula-column expressions
//!
//! Report formula columns are small arithmetic expressions over the numeric
//! values of a row: number literals, bare column keys, `+ - * /`, unary
//! minus and parentheses. Expressions are parsed into an AST and evaluated
//! directly; nothing is ever handed to a general-purpose interpreter.
//!
//! PIPELINE: expression string --> Lexer --> Tokens --> Parser --> AST --> evaluate
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgerdesk::formula::Formula;
//!
//! let formula = Formula::parse("(amount - fees) * 1.2")?;
//! let value = formula.evaluate(|key| match key {
//!     "amount" => Some(100.0),
//!     "fees" => Some(10.0),
//!     _ => None,
//! })?;
//! assert_eq!(value, 108.0);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

use std::collections::BTreeSet;

use thiserror::Error;

use crate::models::{CellValue, DatabaseSchema, Row};

pub use ast::{BinaryOperator, Expression};
pub use parser::parse;

/// Errors from parsing or evaluating a formula
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("illegal character '{0}' in formula")]
    IllegalCharacter(char),

    #[error("unknown column '{0}' in formula")]
    UnknownColumn(String),

    #[error("formula result is not a finite number")]
    NonFinite,
}

/// A parsed formula, reusable across rows
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expression: Expression,
}

impl Formula {
    /// Parse an expression string
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Ok(Self {
            source: source.to_string(),
            expression: parse(source)?,
        })
    }

    /// The original expression text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Column keys referenced by the expression
    pub fn references(&self) -> BTreeSet<&str> {
        self.expression.references()
    }

    /// Evaluate with a column lookup; `None` from the lookup means the key is unknown
    pub fn evaluate<F>(&self, lookup: F) -> Result<f64, FormulaError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let value = eval(&self.expression, &lookup)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// Evaluate against a stored row of a database with the given schema
    ///
    /// Only keys declared in the schema resolve. Cell values are read as
    /// numbers; anything non-numeric (text, null, missing) counts as 0 and
    /// booleans count as 1 or 0. The result is rounded to 2 decimal places.
    pub fn evaluate_row(&self, row: &Row, schema: &DatabaseSchema) -> Result<f64, FormulaError> {
        self.evaluate(|key| {
            schema
                .has_column(key)
                .then(|| row.get(key).map(operand_value).unwrap_or(0.0))
        })
        .map(round2)
    }
}

/// Evaluate a formula expression against one row
///
/// Returns `None` on any parse or evaluation failure, including references
/// to keys outside the schema, characters outside the arithmetic grammar,
/// and division by zero.
pub fn evaluate_row_formula(expression: &str, row: &Row, schema: &DatabaseSchema) -> Option<f64> {
    Formula::parse(expression)
        .and_then(|formula| formula.evaluate_row(row, schema))
        .ok()
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn operand_value(value: &CellValue) -> f64 {
    match value {
        CellValue::Boolean(true) => 1.0,
        CellValue::Boolean(false) => 0.0,
        other => other.as_number().unwrap_or(0.0),
    }
}

fn eval<F>(expression: &Expression, lookup: &F) -> Result<f64, FormulaError>
where
    F: Fn(&str) -> Option<f64>,
{
    match expression {
        Expression::Number(n) => Ok(*n),
        Expression::Column(key) => {
            lookup(key).ok_or_else(|| FormulaError::UnknownColumn(key.clone()))
        }
        Expression::Negate(operand) => Ok(-eval(operand, lookup)?),
        Expression::BinaryOp { left, op, right } => {
            Ok(op.apply(eval(left, lookup)?, eval(right, lookup)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDefinition, DataType};

    fn schema() -> DatabaseSchema {
        DatabaseSchema::new(vec![
            ColumnDefinition::new("amount", "Amount", DataType::Currency),
            ColumnDefinition::new("fees", "Fees", DataType::Number),
            ColumnDefinition::new("note", "Note", DataType::Text),
            ColumnDefinition::new("billable", "Billable", DataType::Boolean),
        ])
    }

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_basic_evaluation() {
        let r = row(&[
            ("amount", CellValue::from("$1,000.50")),
            ("fees", CellValue::Number(0.25)),
        ]);
        assert_eq!(evaluate_row_formula("amount - fees", &r, &schema()), Some(1000.25));
        assert_eq!(evaluate_row_formula("(amount + 1) * 2", &r, &schema()), Some(2003.0));
    }

    #[test]
    fn test_rounds_to_two_places() {
        let r = row(&[("amount", CellValue::Number(10.0))]);
        assert_eq!(evaluate_row_formula("amount / 3", &r, &schema()), Some(3.33));
        assert_eq!(evaluate_row_formula("0.1 + 0.2", &r, &schema()), Some(0.3));
    }

    #[test]
    fn test_non_numeric_values_count_as_zero() {
        let r = row(&[
            ("amount", CellValue::from("n/a")),
            ("note", CellValue::from("hello")),
            ("billable", CellValue::Boolean(true)),
        ]);
        assert_eq!(evaluate_row_formula("amount + 5", &r, &schema()), Some(5.0));
        assert_eq!(evaluate_row_formula("note + fees", &r, &schema()), Some(0.0));
        assert_eq!(evaluate_row_formula("billable * 10", &r, &schema()), Some(10.0));
    }

    #[test]
    fn test_injection_attempts_return_none() {
        let r = row(&[("amount", CellValue::Number(1.0))]);
        for expr in [
            "amount; process.exit()",
            "constructor.constructor('return 1')()",
            "amount || 1",
            "`amount`",
            "amount\n}",
            "this",
        ] {
            assert_eq!(evaluate_row_formula(expr, &r, &schema()), None, "{}", expr);
        }
    }

    #[test]
    fn test_unknown_column_and_division_by_zero() {
        let r = row(&[("amount", CellValue::Number(1.0))]);
        assert_eq!(evaluate_row_formula("amount + tax", &r, &schema()), None);
        assert_eq!(evaluate_row_formula("amount / 0", &r, &schema()), None);
        assert_eq!(evaluate_row_formula("", &r, &schema()), None);
    }

    #[test]
    fn test_long_chain_returns_none() {
        let r = row(&[("amount", CellValue::Number(1.0))]);
        let chain = vec!["1"; 20_000].join("+");
        assert_eq!(evaluate_row_formula(&chain, &r, &schema()), None);

        let chain = vec!["amount"; 200_000].join(" - ");
        assert_eq!(evaluate_row_formula(&chain, &r, &schema()), None);
    }

    #[test]
    fn test_references() {
        let formula = Formula::parse("(amount - fees) / amount").unwrap();
        let refs: Vec<&str> = formula.references().into_iter().collect();
        assert_eq!(refs, vec!["amount", "fees"]);
        assert_eq!(formula.source(), "(amount - fees) / amount");
    }

    #[test]
    fn test_evaluate_with_lookup() {
        let formula = Formula::parse("x * y").unwrap();
        let value = formula
            .evaluate(|k| match k {
                "x" => Some(3.0),
                "y" => Some(4.0),
                _ => None,
            })
            .unwrap();
        assert_eq!(value, 12.0);
        assert_eq!(
            formula.evaluate(|_| None),
            Err(FormulaError::UnknownColumn("x".into()))
        );
    }
}
