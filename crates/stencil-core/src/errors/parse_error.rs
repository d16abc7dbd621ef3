//! Template syntax errors.

use serde::Serialize;

/// A syntax error in one template, with an approximate location.
///
/// Per-template and non-fatal: the template is marked invalid, extraction
/// and performance analysis are skipped, and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("syntax error at line {line}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}
