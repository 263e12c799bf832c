//! Worksheet type
//!
//! A single sheet: the header row, the data rows and the column widths that
//! an export produces, or the cells an import reads back.

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellValue};
use crate::error::{Error, Result};
use crate::style::Style;
use crate::{MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN};

/// Default column width in characters
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// A single worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Non-empty cells, in row-major order
    cells: BTreeMap<CellAddress, CellData>,
    /// Custom column widths
    column_widths: BTreeMap<u16, f64>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        validate_sheet_name(&name)?;
        Ok(Self {
            name,
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
        })
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(&addr))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(&CellAddress::new(row, col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Iterate over stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (&CellAddress, &CellData)> {
        self.cells.iter()
    }

    /// Cells of one row, in column order
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells
            .range(CellAddress::new(row, 0)..=CellAddress::new(row, MAX_COLS - 1))
            .map(|(addr, data)| (addr.col, data))
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices, keeping any style
    ///
    /// Setting [`CellValue::Empty`] on an unstyled cell removes it.
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        validate_cell_position(row, col)?;
        let addr = CellAddress::new(row, col);
        let value = value.into();
        match self.cells.get_mut(&addr) {
            Some(data) => {
                data.value = value;
                if data.value.is_empty() && data.style.is_default() {
                    self.cells.remove(&addr);
                }
            }
            None if value.is_empty() => {}
            None => {
                self.cells.insert(addr, CellData::new(value));
            }
        }
        Ok(())
    }

    /// Set a value and style together
    pub fn set_cell_styled_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
        style: Style,
    ) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells
            .insert(CellAddress::new(row, col), CellData::styled(value.into(), style));
        Ok(())
    }

    // === Dimensions ===

    /// Bounds of all stored cells as `(min_row, min_col, max_row, max_col)`
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let first = self.cells.keys().next()?;
        let last = self.cells.keys().next_back()?;
        let min_col = self.cells.keys().map(|a| a.col).min()?;
        let max_col = self.cells.keys().map(|a| a.col).max()?;
        Some((first.row, min_col, last.row, max_col))
    }

    /// The used range in A1 notation ("A1" for an empty sheet)
    pub fn dimension(&self) -> String {
        match self.used_bounds() {
            None => "A1".to_string(),
            Some((r1, c1, r2, c2)) if r1 == r2 && c1 == c2 => {
                CellAddress::new(r1, c1).to_a1_string()
            }
            Some((r1, c1, r2, c2)) => format!(
                "{}:{}",
                CellAddress::new(r1, c1),
                CellAddress::new(r2, c2)
            ),
        }
    }

    /// Index of the last stored row, if any
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|a| a.row)
    }

    /// Get column width
    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    /// Set column width
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    /// Columns with a custom width
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the worksheet is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "Sheet name too long (max {} characters)",
            MAX_SHEET_NAME_LEN
        )));
    }

    const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "Sheet name cannot contain '{}'",
            c
        )));
    }
    Ok(())
}

fn validate_cell_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sheet_names() {
        assert!(Worksheet::new("Data").is_ok());
        assert!(Worksheet::new("").is_err());
        assert!(Worksheet::new("a/b").is_err());
        assert!(Worksheet::new("x".repeat(32)).is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut ws = Worksheet::new("Data").unwrap();
        ws.set_cell_value("B2", 42.0).unwrap();
        ws.set_cell_value_at(0, 0, "Header").unwrap();

        assert_eq!(ws.get_value_at(1, 1), CellValue::Number(42.0));
        assert_eq!(ws.cell("A1").unwrap().unwrap().value, CellValue::string("Header"));
        assert_eq!(ws.get_value_at(5, 5), CellValue::Empty);
        assert_eq!(ws.cell_count(), 2);
    }

    #[test]
    fn test_empty_value_removes_unstyled_cell() {
        let mut ws = Worksheet::new("Data").unwrap();
        ws.set_cell_value_at(0, 0, 1.0).unwrap();
        ws.set_cell_value_at(0, 0, CellValue::Empty).unwrap();
        assert!(ws.is_empty());

        ws.set_cell_styled_at(0, 0, CellValue::Empty, Style::header())
            .unwrap();
        ws.set_cell_value_at(0, 0, CellValue::Empty).unwrap();
        assert_eq!(ws.cell_count(), 1);
    }

    #[test]
    fn test_bounds_checked() {
        let mut ws = Worksheet::new("Data").unwrap();
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(ws.set_cell_value_at(0, MAX_COLS, 1.0).is_err());
    }

    #[test]
    fn test_dimension_and_rows() {
        let mut ws = Worksheet::new("Data").unwrap();
        assert_eq!(ws.dimension(), "A1");

        ws.set_cell_value_at(0, 0, "a").unwrap();
        ws.set_cell_value_at(2, 31, "b").unwrap();
        ws.set_cell_value_at(2, 3, "c").unwrap();
        assert_eq!(ws.dimension(), "A1:AF3");
        assert_eq!(ws.max_row(), Some(2));

        let cols: Vec<u16> = ws.row_cells(2).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![3, 31]);
    }

    #[test]
    fn test_column_widths() {
        let mut ws = Worksheet::new("Data").unwrap();
        assert!((ws.column_width(0) - DEFAULT_COLUMN_WIDTH).abs() < 0.001);
        ws.set_column_width(3, 15.0);
        assert_eq!(ws.column_width(3), 15.0);
        assert_eq!(ws.custom_column_widths().len(), 1);
    }
}
