//! # weighbill-xlsx
//!
//! XLSX (Office Open XML) reader and writer for weighbill.
//!
//! Exports are single-sheet workbooks, so both directions work on one
//! [`Worksheet`](weighbill_core::Worksheet): the writer produces a workbook
//! holding exactly that sheet, and the reader returns the first sheet of a
//! workbook.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
