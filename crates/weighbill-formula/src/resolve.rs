//! Translation of named-reference expressions into sheet formulas

use weighbill_core::{column_to_letters, ColumnSchema, HEADER_ROWS};

use crate::reference::{segments, Segment};

/// The reserved auto-increment expression
pub const AUTO_INCREMENT: &str = "=ROW()-1";

/// Check whether an expression is the auto-increment pseudo-formula
///
/// The comparison ignores surrounding whitespace and case.
pub fn is_auto_increment(expression: &str) -> bool {
    expression.trim().eq_ignore_ascii_case(AUTO_INCREMENT)
}

/// Outcome of resolving an expression for one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every reference named a schema column
    Resolved(String),
    /// Some references were left as bracketed text
    PartiallyResolved {
        /// The formula, with unknown references untouched
        formula: String,
        /// Unknown names, in order of first appearance
        unresolved: Vec<String>,
    },
}

impl Resolution {
    /// The resolved formula text
    pub fn formula(&self) -> &str {
        match self {
            Resolution::Resolved(f) => f,
            Resolution::PartiallyResolved { formula, .. } => formula,
        }
    }

    /// Consume and return the formula text
    pub fn into_formula(self) -> String {
        match self {
            Resolution::Resolved(f) => f,
            Resolution::PartiallyResolved { formula, .. } => formula,
        }
    }

    /// True when nothing was left unresolved
    pub fn is_complete(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// Names that did not match a schema column
    pub fn unresolved(&self) -> &[String] {
        match self {
            Resolution::Resolved(_) => &[],
            Resolution::PartiallyResolved { unresolved, .. } => unresolved,
        }
    }
}

/// Resolve a named-reference expression for data row `row_index` (1-based)
///
/// Each `[Name]` that exactly matches a schema column becomes that column's
/// letter followed by the sheet row (`row_index` plus the header row).
/// Everything else, function calls included, is copied through. A leading
/// `=` is added when missing. The auto-increment expression is returned in
/// its canonical form, and a blank expression resolves to an empty string.
///
/// # Example
/// ```rust
/// use weighbill_core::{Column, ColumnSchema};
/// use weighbill_formula::resolve;
///
/// let schema = ColumnSchema::new(vec![Column::row("A"), Column::row("B")]).unwrap();
/// assert_eq!(resolve("=[A]+[B]", &schema, 1).formula(), "=A2+B2");
/// assert_eq!(resolve("=[A]+[B]", &schema, 5).formula(), "=A6+B6");
/// ```
pub fn resolve(expression: &str, schema: &ColumnSchema, row_index: u32) -> Resolution {
    if expression.trim().is_empty() {
        return Resolution::Resolved(String::new());
    }
    if is_auto_increment(expression) {
        return Resolution::Resolved(AUTO_INCREMENT.to_string());
    }

    let sheet_row = row_index as u64 + HEADER_ROWS as u64;
    let mut formula = String::with_capacity(expression.len());
    let mut unresolved: Vec<String> = Vec::new();

    for segment in segments(expression) {
        match segment {
            Segment::Text(text) => formula.push_str(text),
            Segment::Reference(name) => match schema.position(name) {
                Some(pos) => {
                    formula.push_str(&column_to_letters(pos as u32));
                    formula.push_str(&sheet_row.to_string());
                }
                None => {
                    formula.push('[');
                    formula.push_str(name);
                    formula.push(']');
                    if !unresolved.iter().any(|u| u == name) {
                        unresolved.push(name.to_string());
                    }
                }
            },
        }
    }

    if !formula.trim_start().starts_with('=') {
        formula.insert(0, '=');
    }

    if unresolved.is_empty() {
        Resolution::Resolved(formula)
    } else {
        Resolution::PartiallyResolved {
            formula,
            unresolved,
        }
    }
}
