//! Error types for parsing and field access

use thiserror::Error;

/// Errors raised while a grammar node consumes tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A non-optional grammar node could not claim the token(s) it needs.
    /// `found` is `None` when the line ran out, otherwise the offending token.
    #[error("{node}: expected {expected}, found {}", describe_found(.found))]
    RequiredTokenMissing {
        node: &'static str,
        expected: &'static str,
        found: Option<String>,
    },
}

impl ParseError {
    pub fn missing(node: &'static str, expected: &'static str, found: Option<&String>) -> Self {
        ParseError::RequiredTokenMissing {
            node,
            expected,
            found: found.cloned(),
        }
    }
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(token) => format!("`{}`", token),
        None => "end of line".to_string(),
    }
}

/// Errors raised by name-keyed reads and writes on a parsed node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The name matches neither an own field, a child, nor an open attribute
    #[error("{node} has no field or child named `{name}`")]
    NoSuchField { node: &'static str, name: String },
    /// The field is fixed at construction (e.g. `raw_text`) or derived
    #[error("field `{name}` of {node} is read-only")]
    ReadOnlyField { node: &'static str, name: String },
    /// The field is part of the grammar shape and cannot be removed
    #[error("field `{name}` of {node} is required and cannot be deleted")]
    RequiredField { node: &'static str, name: String },
    /// The value written does not fit the slot
    #[error("field `{name}` of {node} expects {expected}")]
    FieldTypeMismatch {
        node: &'static str,
        name: String,
        expected: &'static str,
    },
}

/// Type alias for parser results
pub type ParseResult<T> = Result<T, ParseError>;

/// Type alias for field access results
pub type FieldResult<T> = Result<T, FieldError>;
