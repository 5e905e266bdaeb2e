//! Expression tree for formula columns

use std::collections::BTreeSet;

/// A parsed arithmetic expression
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(f64),
    /// Reference to a column key in the current row
    Column(String),
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
        }
    }
}

impl Expression {
    /// Every column key the expression reads
    pub fn references(&self) -> BTreeSet<&str> {
        let mut keys = BTreeSet::new();
        self.collect_references(&mut keys);
        keys
    }

    fn collect_references<'a>(&'a self, keys: &mut BTreeSet<&'a str>) {
        match self {
            Expression::Number(_) => {}
            Expression::Column(key) => {
                keys.insert(key.as_str());
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_references(keys);
                right.collect_references(keys);
            }
            Expression::Negate(operand) => operand.collect_references(keys),
        }
    }
}
