//! Error types for the entry session

use std::path::PathBuf;

use thiserror::Error;
use weighbill_core::{ColumnKind, ValidationReport};
use weighbill_formula::FormulaError;
use weighbill_xlsx::XlsxError;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Broad class of a failure, for callers that only need to react by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad configuration or an unreadable state file
    Config,
    /// Reading or writing a store, suggestion list or session file
    Io,
    /// Writing an exported workbook
    Write,
    /// Reading a workbook to import
    Import,
    /// A request that does not fit the schema or the current rows
    Input,
    /// A formula referenced columns that do not exist
    Resolution,
    /// Entries failed validation
    Validation,
}

/// Errors returned by session operations
#[derive(Debug, Error)]
pub enum Error {
    /// Schema or row model error
    #[error(transparent)]
    Core(#[from] weighbill_core::Error),

    /// Formula store error
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while writing a state file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The exported workbook could not be written
    #[error("Failed to write workbook {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// The workbook to import could not be read
    #[error("Failed to import {}: {source}", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// The session file exists but cannot be used
    #[error("Session file {} is invalid: {message}", .path.display())]
    InvalidSession { path: PathBuf, message: String },

    /// An environment or configuration value was not understood
    #[error("Invalid value for {name}: '{value}'")]
    InvalidConfig { name: String, value: String },

    /// A name that is not a schema column
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A value was given for a column of the wrong category
    #[error("Column '{column}' is a {} column", .kind.as_str())]
    WrongCategory { column: String, kind: ColumnKind },

    /// Formula columns are computed and cannot be edited
    #[error("Column '{0}' is computed by a formula and cannot be edited")]
    NotEditable(String),

    /// A 1-based row number outside the current rows
    #[error("Row {row} does not exist (there are {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    /// The cell is a plain value, not a formula cell
    #[error("Row {row}, {column} is not a formula cell")]
    NotFormulaCell { row: usize, column: String },

    /// The column has no stored formula
    #[error("No formula is defined for {0}")]
    NoFormula(String),

    /// Nothing to export
    #[error("There are no rows to submit")]
    NoRows,

    /// A formula could not be fully resolved and the policy rejects it
    #[error("Row {row}, {column}: unresolved references {}", format_names(.unresolved))]
    Unresolved {
        row: usize,
        column: String,
        unresolved: Vec<String>,
    },

    /// Entries failed validation and the caller required them to pass
    #[error("{0}")]
    Validation(ValidationReport),
}

fn format_names(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("[{}]", n))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Broad class of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Core(_) => FailureKind::Input,
            Error::Formula(FormulaError::InvalidStore { .. }) => FailureKind::Config,
            Error::Formula(_) | Error::Io(_) | Error::Json(_) => FailureKind::Io,
            Error::Write { .. } => FailureKind::Write,
            Error::Import { .. } => FailureKind::Import,
            Error::InvalidSession { .. } | Error::InvalidConfig { .. } => FailureKind::Config,
            Error::UnknownColumn(_)
            | Error::WrongCategory { .. }
            | Error::NotEditable(_)
            | Error::RowOutOfRange { .. }
            | Error::NotFormulaCell { .. }
            | Error::NoFormula(_)
            | Error::NoRows => FailureKind::Input,
            Error::Unresolved { .. } => FailureKind::Resolution,
            Error::Validation(_) => FailureKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_messages() {
        let err = Error::Unresolved {
            row: 2,
            column: "Shortage".into(),
            unresolved: vec!["Bill Wt".into(), "Kanda".into()],
        };
        assert_eq!(err.kind(), FailureKind::Resolution);
        assert_eq!(
            err.to_string(),
            "Row 2, Shortage: unresolved references [Bill Wt], [Kanda]"
        );

        let err = Error::NotEditable("MRN No.".into());
        assert_eq!(err.kind(), FailureKind::Input);

        let err = Error::Write {
            path: PathBuf::from("out.xlsx"),
            source: XlsxError::NotAWorkbook("x".into()),
        };
        assert_eq!(err.kind(), FailureKind::Write);
        assert!(err.to_string().starts_with("Failed to write workbook out.xlsx"));
    }
}
