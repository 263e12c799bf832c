//! # weighbill-formula
//!
//! Named-reference formulas for weighbill.
//!
//! Formula columns are defined by expressions such as
//! `=[Bill Wt (Qtl)] * [Basic Rate as per Bill]`, where each `[Column Name]`
//! refers to another column of the same row. This crate provides:
//! - [`FormulaSet`] - The persisted, ordered store of definitions
//! - [`resolve`] - Translation of an expression into a sheet formula for one row
//! - [`lint`] - Advisory checks over stored definitions
//!
//! ## Example
//!
//! ```rust
//! use weighbill_core::ColumnSchema;
//! use weighbill_formula::{resolve, FormulaSet};
//!
//! let formulas = FormulaSet::defaults();
//! let expr = formulas.expression("Shortage Amt").unwrap();
//! let resolution = resolve(expr, ColumnSchema::bill(), 2);
//! assert_eq!(resolution.formula(), "=Y3 * N3");
//! ```

pub mod error;
pub mod lint;
pub mod reference;
pub mod resolve;
pub mod store;

pub use error::{FormulaError, FormulaResult};
pub use lint::{lint, FormulaIssue, IssueKind, SUPPORTED_FUNCTIONS};
pub use reference::{references, segments, Segment};
pub use resolve::{is_auto_increment, resolve, Resolution, AUTO_INCREMENT};
pub use store::{FormulaDefinition, FormulaSet, DEFAULT_FORMULAS};
