//! # weighbill
//!
//! Purchase-bill entry with named-reference formulas and XLSX export.
//!
//! Bills are entered one row at a time into an [`EntrySession`]. Input
//! columns keep the text that was typed; formula columns show a placeholder
//! until export, when each one becomes a real sheet formula resolved for the
//! row it lands on.
//!
//! ## Example
//!
//! ```rust,no_run
//! use weighbill::{Config, EntrySession, FieldValues};
//!
//! let mut session = EntrySession::open(Config::from_env(None)?)?;
//!
//! let mut globals = FieldValues::new();
//! globals.insert("Basic Rate as per Bill".into(), "2450".into());
//! let mut row = FieldValues::new();
//! row.insert("Bill No.".into(), "B-17".into());
//! row.insert("Bags".into(), "120".into());
//! session.add_row(&globals, &row)?;
//!
//! let report = session.check_entries();
//! println!("{}", report);
//!
//! let exported = session.submit(None)?;
//! println!("Saved {}", exported.path.display());
//! # Ok::<(), weighbill::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod materialize;
pub mod session;
pub mod suggestions;

pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use export::{
    build_sheet, default_destination, export, ExportOptions, ExportReport, ExportWarning,
    UnresolvedPolicy,
};
pub use import::{read_workbook, rows_from_sheet, ImportSummary};
pub use materialize::{materialize, FieldValues};
pub use session::EntrySession;
pub use suggestions::{SuggestionStore, SuggestionUpdate};

// Re-export the types that appear in this crate's API
pub use weighbill_core::{
    column_to_letters, Column, ColumnKind, ColumnSchema, MaterializedRow, NumericCheck, RowCell,
    ValidationError, ValidationReport, PLACEHOLDER,
};
pub use weighbill_formula::{
    lint, resolve, FormulaDefinition, FormulaIssue, FormulaSet, IssueKind, Resolution,
};
