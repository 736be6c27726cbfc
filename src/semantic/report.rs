//! 语义诊断

use std::fmt;

use crate::error::SourceLocation;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Semantic,
}

/// 一条诊断，按遍历顺序累积，不去重
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub stage: Stage,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Report {
    pub fn new(severity: Severity, loc: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage: Stage::Semantic,
            line: loc.line,
            column: loc.column,
            message: message.into(),
        }
    }

    pub fn error(loc: SourceLocation, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, loc, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@SEMANTIC, line {}, col {}: {}",
            self.severity, self.line, self.column, self.message
        )
    }
}

pub fn non_static_in_static_context(loc: SourceLocation, name: &str) -> Report {
    Report::error(loc, format!("non-static {} cannot be referenced from a static context", name))
}

pub fn cannot_find_symbol(loc: SourceLocation, name: &str) -> Report {
    Report::error(loc, format!("cannot find symbol '{}'", name))
}

pub fn undefined_array(loc: SourceLocation, name: &str) -> Report {
    Report::error(loc, format!("Undefined array: {}", name))
}

pub fn array_access_on_non_array(loc: SourceLocation, name: &str) -> Report {
    Report::error(loc, format!("array access on non-array variable '{}'", name))
}

pub fn array_required(loc: SourceLocation, found: &Type) -> Report {
    Report::error(loc, format!("array required, but {} found", found))
}

pub fn invalid_array_index_type(loc: SourceLocation, found: &Type) -> Report {
    Report::error(
        loc,
        format!("Invalid array index type: {}. The index must be of type int.", found),
    )
}

pub fn operator_cannot_be_applied(loc: SourceLocation, op: &str, lhs: &Type, rhs: &Type) -> Report {
    Report::error(
        loc,
        format!("operator '{}' cannot be applied to '{}' and '{}'", op, lhs, rhs),
    )
}

pub fn bad_operand_type(loc: SourceLocation, op: &str, operand: &Type) -> Report {
    Report::error(loc, format!("bad operand type '{}' for unary operator '{}'", operand, op))
}

/// `statement` 为 `if` 或 `while`
pub fn invalid_condition_type(loc: SourceLocation, statement: &str, found: &Type) -> Report {
    Report::error(
        loc,
        format!(
            "Invalid condition type in {} statement: Expected boolean, but found {}",
            statement, found
        ),
    )
}

pub fn this_in_main(loc: SourceLocation) -> Report {
    Report::error(loc, "Cannot use 'this' in static context. Main method is static.")
}

pub fn invalid_static_call(loc: SourceLocation, method: &str) -> Report {
    Report::error(
        loc,
        format!(
            "Invalid static method call: Cannot call a non-static method '{}' from a static method.",
            method
        ),
    )
}

pub fn wrong_argument_count(loc: SourceLocation, method: &str) -> Report {
    Report::error(loc, format!("Wrong number of arguments for method '{}'", method))
}

/// `index` 从 0 开始，消息中显示为从 1 开始
pub fn incompatible_argument(
    loc: SourceLocation,
    method: &str,
    index: usize,
    expected: &Type,
    found: &Type,
) -> Report {
    Report::error(
        loc,
        format!(
            "Incompatible argument type for parameter {} of method '{}': expected '{}', found '{}'",
            index + 1,
            method,
            expected,
            found
        ),
    )
}

pub fn method_not_declared(loc: SourceLocation, method: &str) -> Report {
    Report::error(loc, format!("Method {} is not declared", method))
}

pub fn incompatible_types(loc: SourceLocation, found: &Type, required: &Type) -> Report {
    Report::error(
        loc,
        format!("incompatible types: {} cannot be converted to {}", found, required),
    )
}

pub fn return_in_main(loc: SourceLocation) -> Report {
    Report::error(loc, "Main method should not have a return statement.")
}

pub fn incompatible_return_type(loc: SourceLocation, method: &str, expected: &Type, found: &Type) -> Report {
    Report::error(
        loc,
        format!(
            "Incompatible return type in method '{}'. Expected '{}', found '{}'",
            method, expected, found
        ),
    )
}
