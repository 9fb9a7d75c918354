//! Core error types.

use thiserror::Error;

/// Errors from scanning, building and dumping a state machine document.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{count} line(s) ignored, first at line {first_line}")]
    IgnoredLines { count: usize, first_line: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns a stable error code suitable for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Io(_) => "IO_ERROR",
            CoreError::IgnoredLines { .. } => "IGNORED_LINES",
            CoreError::Json(_) => "JSON_ERROR",
        }
    }
}
