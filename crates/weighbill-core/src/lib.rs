//! # weighbill-core
//!
//! Core data structures for weighbill, a purchase-bill entry tool that
//! exports weighment bills to spreadsheets.
//!
//! This crate provides the types every other weighbill crate builds on:
//! - [`ColumnSchema`] - The ordered bill columns and their categories
//! - [`MaterializedRow`] and [`RowCell`] - One entered bill row, as displayed
//! - [`CellAddress`] and the column-letter helpers - Sheet addressing
//! - [`Worksheet`] and [`CellValue`] - The single-sheet model handed to the XLSX writer
//! - [`validate`] - Required/numeric/date checks over entered rows
//! - [`fs::atomic_write`] - Temp-file-and-rename writes used for every saved file
//!
//! ## Example
//!
//! ```rust
//! use weighbill_core::{ColumnKind, ColumnSchema};
//!
//! let schema = ColumnSchema::bill();
//! assert_eq!(schema.kind_of("MRN No."), Some(ColumnKind::Formula));
//! assert_eq!(schema.letter_of("Bill No.").as_deref(), Some("C"));
//! ```

pub mod cell;
pub mod error;
pub mod fs;
pub mod row;
pub mod schema;
pub mod style;
pub mod validation;
pub mod worksheet;

pub use cell::{
    column_to_letters, letters_to_column, parse_decimal, parse_grouped_number, CellAddress,
    CellData, CellValue,
};
pub use error::{Error, Result};
pub use row::{MaterializedRow, RowCell, PLACEHOLDER};
pub use schema::{Column, ColumnKind, ColumnSchema};
pub use style::{HorizontalAlignment, NumberFormat, Style};
pub use validation::{
    validate, NumericCheck, BILL_DATE_FORMAT, ValidationError, ValidationErrorKind, ValidationReport,
    ValidationRules,
};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Number of header rows above the first data row on an exported sheet
pub const HEADER_ROWS: u32 = 1;
