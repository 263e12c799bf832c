//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in an exported sheet cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellData`] - Value plus style, as stored on a [`Worksheet`](crate::Worksheet)
//! - Number parsing used by export coercion and validation

mod address;
mod number;
mod value;

pub use address::{column_to_letters, letters_to_column, CellAddress};
pub use number::{parse_decimal, parse_grouped_number};
pub use value::{CellData, CellValue};
