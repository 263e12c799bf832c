//! Materialized rows
//!
//! A materialized row is one entered bill as it sits in the entry table:
//! literal text for input columns, a pending marker for formula columns
//! (rendered as [`PLACEHOLDER`]) and the computed counter for the
//! auto-increment column.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{Column, ColumnSchema};

/// Text shown in place of a formula result until export
pub const PLACEHOLDER: &str = "📝 Formula";

/// State of one cell in a materialized row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RowCell {
    /// Text captured from the form
    Literal(String),
    /// Formula cell, resolved against the column's formula at export time
    Pending,
    /// Value known at entry time (the auto-increment counter)
    Computed(i64),
}

impl RowCell {
    /// An empty literal
    pub fn empty() -> Self {
        RowCell::Literal(String::new())
    }

    /// Check for the pending state
    pub fn is_pending(&self) -> bool {
        matches!(self, RowCell::Pending)
    }

    /// Literal text, if this is a literal
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            RowCell::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the cell holds nothing a user would see
    pub fn is_blank(&self) -> bool {
        match self {
            RowCell::Literal(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text as shown in the entry table
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            RowCell::Literal(s) => Cow::Borrowed(s),
            RowCell::Pending => Cow::Borrowed(PLACEHOLDER),
            RowCell::Computed(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl Default for RowCell {
    fn default() -> Self {
        RowCell::empty()
    }
}

/// One row of the entry table, one cell per schema column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterializedRow {
    cells: Vec<RowCell>,
}

impl MaterializedRow {
    /// Create a row, checking it has one cell per schema column
    pub fn new(schema: &ColumnSchema, cells: Vec<RowCell>) -> Result<Self> {
        if cells.len() != schema.len() {
            return Err(Error::RowLength {
                expected: schema.len(),
                actual: cells.len(),
            });
        }
        Ok(Self { cells })
    }

    /// Build a row by computing one cell per schema column, in order
    pub fn build<F>(schema: &ColumnSchema, mut cell_for: F) -> Self
    where
        F: FnMut(usize, &Column) -> RowCell,
    {
        let cells = schema
            .columns()
            .iter()
            .enumerate()
            .map(|(position, column)| cell_for(position, column))
            .collect();
        Self { cells }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in schema order
    pub fn cells(&self) -> &[RowCell] {
        &self.cells
    }

    /// Cell at a 0-based column position
    pub fn get(&self, position: usize) -> Option<&RowCell> {
        self.cells.get(position)
    }

    /// Cell for a named column
    pub fn cell<'a>(&'a self, schema: &ColumnSchema, name: &str) -> Option<&'a RowCell> {
        schema.position(name).and_then(|i| self.cells.get(i))
    }

    /// Replace the cell at a 0-based position
    pub fn set(&mut self, position: usize, cell: RowCell) -> Result<()> {
        let len = self.cells.len();
        let slot = self.cells.get_mut(position).ok_or_else(|| {
            Error::other(format!("column position {} out of range ({})", position, len))
        })?;
        *slot = cell;
        Ok(())
    }

    /// Display text of every cell, in order
    pub fn display_values(&self) -> Vec<Cow<'_, str>> {
        self.cells.iter().map(RowCell::display).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            Column::formula("No."),
            Column::row("Name"),
            Column::formula("Total"),
        ])
        .unwrap()
    }

    #[test]
    fn test_display_values() {
        let row = MaterializedRow::new(
            &schema(),
            vec![
                RowCell::Computed(3),
                RowCell::Literal("Ravi".into()),
                RowCell::Pending,
            ],
        )
        .unwrap();
        assert_eq!(row.display_values(), vec!["3", "Ravi", PLACEHOLDER]);
    }

    #[test]
    fn test_build_follows_schema_order() {
        let row = MaterializedRow::build(&schema(), |pos, col| {
            if col.kind.is_input() {
                RowCell::Literal(format!("{}@{}", col.name, pos))
            } else {
                RowCell::Pending
            }
        });
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1), Some(&RowCell::Literal("Name@1".into())));
        assert!(row.get(2).unwrap().is_pending());
    }

    #[test]
    fn test_length_must_match_schema() {
        let err = MaterializedRow::new(&schema(), vec![RowCell::Pending]).unwrap_err();
        assert!(matches!(
            err,
            Error::RowLength {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_placeholder_text_is_still_a_literal() {
        let typed = RowCell::Literal(PLACEHOLDER.into());
        assert!(!typed.is_pending());
        assert_ne!(typed, RowCell::Pending);
    }

    #[test]
    fn test_serde_shape() {
        let row = MaterializedRow::new(
            &schema(),
            vec![RowCell::Computed(1), RowCell::Literal("x".into()), RowCell::Pending],
        )
        .unwrap();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"[{"state":"computed","value":1},{"state":"literal","value":"x"},{"state":"pending"}]"#
        );
        let back: MaterializedRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
