//! Sheet cell value types

use std::fmt;

use crate::style::Style;

/// Represents the value stored in a cell of an exported (or imported) sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Formula, evaluated by the spreadsheet application that opens the file
    Formula {
        /// Formula text including the leading `=` (e.g., "=K2*N2")
        text: String,
    },
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a new formula value, adding the leading `=` if missing
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = if text.starts_with('=') {
            text
        } else {
            format!("={}", text)
        };
        CellValue::Formula { text }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            // Whole numbers print without a trailing ".0" (bag counts, MRN numbers)
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Formula { text } => write!(f, "{}", text),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

/// A cell's value together with its style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// The cell value
    pub value: CellValue,
    /// Display style
    pub style: Style,
}

impl CellData {
    /// Create cell data with the default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: Style::default(),
        }
    }

    /// Create cell data with an explicit style
    pub fn styled(value: CellValue, style: Style) -> Self {
        Self { value, style }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_gets_equals_prefix() {
        assert_eq!(CellValue::formula("A1+B1").formula_text(), Some("=A1+B1"));
        assert_eq!(CellValue::formula("=A1").formula_text(), Some("=A1"));
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12");
        assert_eq!(CellValue::Number(1234.5).to_string(), "1234.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
