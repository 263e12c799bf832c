//! Formula error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while loading, saving or editing formulas
#[derive(Debug, Error)]
pub enum FormulaError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file is not valid JSON of the expected shape
    #[error("Invalid formula store {path}: {message}")]
    InvalidStore { path: PathBuf, message: String },

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
