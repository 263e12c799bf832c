//! Errors raised while reading or writing a bill workbook

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive is a zip but not a spreadsheet package
    #[error("Not an XLSX workbook: {0}")]
    NotAWorkbook(String),

    /// A part the workbook refers to is not in the archive
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A `<c>` element whose reference or value cannot be used
    #[error("Bad cell '{reference}': {message}")]
    BadCell { reference: String, message: String },

    /// The sheet data did not fit the in-memory worksheet
    #[error("Sheet error: {0}")]
    Sheet(#[from] weighbill_core::Error),
}

impl XlsxError {
    pub(crate) fn bad_cell(reference: &str, message: impl Into<String>) -> Self {
        XlsxError::BadCell {
            reference: reference.to_string(),
            message: message.into(),
        }
    }
}
