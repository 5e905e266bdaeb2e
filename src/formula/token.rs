//! Tokens produced by the formula lexer

use std::fmt;

/// Tokens recognized by the formula lexer
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Number(f64),
    /// Bare column key
    Identifier(String),

    Plus,
    Minus,
    Asterisk,
    Slash,
    LParen,
    RParen,

    Eof,
    /// Any character outside the arithmetic grammar
    Illegal(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Eof => write!(f, "end of expression"),
            Token::Illegal(ch) => write!(f, "{}", ch),
        }
    }
}
