//! Error types for weighbill-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weighbill-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u16),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// The same column name appears twice in a schema
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column name that is not part of the schema
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Suggestions were declared on a column that is not a row input
    #[error("Column '{0}' cannot carry suggestions: only row inputs can")]
    SuggestionsNotAllowed(String),

    /// Row does not have one cell per schema column
    #[error("Row has {actual} cells but the schema has {expected} columns")]
    RowLength { expected: usize, actual: usize },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
