use thiserror::Error;
use std::fmt;

use crate::semantic::report::Report;

#[derive(Error, Debug, Clone)]
pub enum JmmError {
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer { line: usize, column: usize, message: String },

    #[error("Parser error at line {line}, column {column}: {message}")]
    Parser { line: usize, column: usize, message: String },

    #[error("Semantic analysis failed with {} error(s)", .0.iter().filter(|r| r.is_error()).count())]
    Semantic(Vec<Report>),

    #[error("IR parse error at line {line}: {message}")]
    IrParse { line: usize, message: String },

    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    #[error("Internal compiler error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type JmmResult<T> = Result<T, JmmError>;

impl From<std::io::Error> for JmmError {
    fn from(err: std::io::Error) -> Self {
        JmmError::Io(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub fn lexer_error(line: usize, column: usize, message: impl Into<String>) -> JmmError {
    JmmError::Lexer {
        line,
        column,
        message: message.into(),
    }
}

pub fn parser_error(line: usize, column: usize, message: impl Into<String>) -> JmmError {
    JmmError::Parser {
        line,
        column,
        message: message.into(),
    }
}

pub fn ir_parse_error(line: usize, message: impl Into<String>) -> JmmError {
    JmmError::IrParse {
        line,
        message: message.into(),
    }
}

pub fn unsupported(message: impl Into<String>) -> JmmError {
    JmmError::Unsupported(message.into())
}

pub fn internal_error(message: impl Into<String>) -> JmmError {
    JmmError::Internal(message.into())
}
