//! Error types for overlay config parsing and editing.
use thiserror::Error;

/// A malformed config line or an unresolvable marker sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{}", line_prefix(.line), .message)]
pub struct ParseError {
    /// 1-based line number, when the problem maps to a single line.
    pub line: Option<usize>,
    pub message: String,
}

impl ParseError {
    pub(crate) fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn document(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }
}

fn line_prefix(line: &Option<usize>) -> String {
    line.map(|line| format!("line {}: ", line))
        .unwrap_or_default()
}

/// Top-level editor error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid value: {0}")]
    Validation(String),
}

impl EditorError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }
}
