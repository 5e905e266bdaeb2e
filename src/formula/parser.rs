//! Recursive descent parser for formula-column expressions
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> ("-" | "+") unary | primary
//!   primary        --> NUMBER | IDENTIFIER | "(" expression ")"

use super::ast::{BinaryOperator, Expression};
use super::lexer::Lexer;
use super::token::Token;
use super::FormulaError;

/// Nesting limit for parentheses and unary operators
const MAX_DEPTH: usize = 64;

/// Limit on binary operators in one expression; bounds the height of the tree
const MAX_OPERATORS: usize = 256;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    depth: usize,
    operators: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned on the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            depth: 0,
            operators: 0,
        }
    }

    /// Parses the entire input.
    pub fn parse(&mut self) -> Result<Expression, FormulaError> {
        if self.current_token == Token::Eof {
            return Err(FormulaError::Parse("empty expression".into()));
        }

        let expr = self.parse_additive()?;

        match self.current_token {
            Token::Eof => Ok(expr),
            Token::Illegal(ch) => Err(FormulaError::IllegalCharacter(ch)),
            ref token => Err(FormulaError::Parse(format!(
                "unexpected '{}' after expression",
                token
            ))),
        }
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else if let Token::Illegal(ch) = self.current_token {
            Err(FormulaError::IllegalCharacter(ch))
        } else {
            Err(FormulaError::Parse(format!(
                "expected '{}', found '{}'",
                expected, self.current_token
            )))
        }
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::Parse("expression is nested too deeply".into()));
        }
        Ok(())
    }

    fn count_operator(&mut self) -> Result<(), FormulaError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(FormulaError::Parse("expression is too long".into()));
        }
        Ok(())
    }

    fn parse_additive(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.count_operator()?;
            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, FormulaError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.count_operator()?;
            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, FormulaError> {
        match self.current_token {
            Token::Minus => {
                self.advance();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expression::Negate(Box::new(operand)))
            }
            Token::Plus => {
                self.advance();
                self.descend()?;
                let operand = self.parse_unary()?;
                self.depth -= 1;
                Ok(operand)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, FormulaError> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }

            Token::Identifier(name) => {
                self.advance();
                Ok(Expression::Column(name))
            }

            Token::LParen => {
                self.advance();
                self.descend()?;
                let expr = self.parse_additive()?;
                self.depth -= 1;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::Eof => Err(FormulaError::Parse("unexpected end of expression".into())),

            Token::Illegal(ch) => Err(FormulaError::IllegalCharacter(ch)),

            token => Err(FormulaError::Parse(format!("unexpected '{}'", token))),
        }
    }
}

/// Parse an expression string into an AST.
pub fn parse(input: &str) -> Result<Expression, FormulaError> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Box<Expression> {
        Box::new(Expression::Column(name.into()))
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a + b * 2").unwrap();
        assert_eq!(
            expr,
            Expression::BinaryOp {
                left: col("a"),
                op: BinaryOperator::Add,
                right: Box::new(Expression::BinaryOp {
                    left: col("b"),
                    op: BinaryOperator::Multiply,
                    right: Box::new(Expression::Number(2.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parentheses_and_unary() {
        let expr = parse("-(a - b)").unwrap();
        assert_eq!(
            expr,
            Expression::Negate(Box::new(Expression::BinaryOp {
                left: col("a"),
                op: BinaryOperator::Subtract,
                right: col("b"),
            }))
        );
        assert_eq!(parse("+5").unwrap(), Expression::Number(5.0));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(""), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("a +"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("(a + b"), Err(FormulaError::Parse(_))));
        assert!(matches!(parse("a b"), Err(FormulaError::Parse(_))));
        assert_eq!(parse("a % b"), Err(FormulaError::IllegalCharacter('%')));
        assert_eq!(parse("a = 1"), Err(FormulaError::IllegalCharacter('=')));
    }

    #[test]
    fn test_function_call_syntax_rejected() {
        // "process(1)" lexes as an identifier followed by a group, which is not
        // a valid expression.
        assert!(parse("process(1)").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(matches!(parse(&deep), Err(FormulaError::Parse(_))));

        let ok = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&ok).unwrap(), Expression::Number(1.0));
    }

    #[test]
    fn test_operator_limit() {
        let long = vec!["1"; 20_000].join("+");
        assert!(matches!(parse(&long), Err(FormulaError::Parse(_))));

        let product = vec!["a"; 5_000].join(" * ");
        assert!(matches!(parse(&product), Err(FormulaError::Parse(_))));

        let fits = vec!["1"; MAX_OPERATORS + 1].join("+");
        assert!(parse(&fits).is_ok());
    }

    #[test]
    fn test_illegal_character_inside_group() {
        assert_eq!(parse("(a % b)"), Err(FormulaError::IllegalCharacter('%')));
        assert_eq!(parse("a * b;"), Err(FormulaError::IllegalCharacter(';')));
    }
}
