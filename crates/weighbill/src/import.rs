//! Reading exported (or hand-made) workbooks back into entry rows

use std::path::Path;

use weighbill_core::{
    CellValue, ColumnKind, ColumnSchema, MaterializedRow, RowCell, Worksheet, HEADER_ROWS,
    PLACEHOLDER,
};
use weighbill_formula::FormulaSet;
use weighbill_xlsx::XlsxReader;

use crate::error::{Error, Result};

/// Result of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows now in the session
    pub rows: usize,
    /// New suggestion values learned from the imported rows
    pub suggestions_added: usize,
    /// Things dropped or reinterpreted while reading
    pub warnings: Vec<String>,
}

/// Read the first sheet of the workbook at `path`
pub fn read_workbook(path: &Path) -> Result<Worksheet> {
    XlsxReader::read_file(path).map_err(|source| Error::Import {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a sheet into rows, positionally against `schema`
///
/// The header row is skipped, as are rows with no visible content. Cells
/// beyond the last schema column are dropped with a warning.
pub fn rows_from_sheet(
    sheet: &Worksheet,
    schema: &ColumnSchema,
    formulas: &FormulaSet,
) -> (Vec<MaterializedRow>, Vec<String>) {
    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let Some(last_row) = sheet.max_row() else {
        return (rows, warnings);
    };

    for sheet_row in HEADER_ROWS..=last_row {
        let visible = sheet
            .row_cells(sheet_row)
            .any(|(_, cell)| !cell.value.to_string().trim().is_empty());
        if !visible {
            continue;
        }

        let extra = sheet
            .row_cells(sheet_row)
            .filter(|(col, cell)| *col as usize >= schema.len() && !cell.value.is_empty())
            .count();
        if extra > 0 {
            warnings.push(format!(
                "Sheet row {}: {} cells beyond the last column were dropped",
                sheet_row + 1,
                extra
            ));
        }

        let row = MaterializedRow::build(schema, |position, column| {
            let value = sheet.get_value_at(sheet_row, position as u16);
            let auto_increment = formulas
                .get(&column.name)
                .map_or(false, |def| def.is_auto_increment());
            cell_from_value(value, column.kind, auto_increment)
        });
        rows.push(row);
    }

    (rows, warnings)
}

fn cell_from_value(value: CellValue, kind: ColumnKind, auto_increment: bool) -> RowCell {
    let formula_column = kind == ColumnKind::Formula;
    match value {
        CellValue::Formula { .. } if formula_column => RowCell::Pending,
        CellValue::String(s) if formula_column && s.trim() == PLACEHOLDER => RowCell::Pending,
        CellValue::Number(n) if auto_increment && n.fract() == 0.0 => RowCell::Computed(n as i64),
        other => RowCell::Literal(other.to_string().trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(name: &str) -> u16 {
        ColumnSchema::bill().position(name).unwrap() as u16
    }

    #[test]
    fn test_rows_from_sheet() {
        let schema = ColumnSchema::bill();
        let mut sheet = Worksheet::new("Data").unwrap();
        for (i, column) in schema.columns().iter().enumerate() {
            sheet
                .set_cell_value_at(0, i as u16, column.name.as_str())
                .unwrap();
        }
        sheet.set_cell_value_at(1, pos("MRN No."), 1.0).unwrap();
        sheet.set_cell_value_at(1, pos("Bill No."), "B-1").unwrap();
        sheet.set_cell_value_at(1, pos("Bags"), 120.0).unwrap();
        sheet.set_cell_value_at(1, pos("Bill Wt (Qtl)"), 52.25).unwrap();
        sheet
            .set_cell_value_at(1, pos("Bill Basic Amt"), CellValue::formula("=K2*N2"))
            .unwrap();
        sheet.set_cell_value_at(1, pos("Shortage"), PLACEHOLDER).unwrap();
        sheet.set_cell_value_at(1, 40, "stray").unwrap();
        // Row 3 is blank, row 4 has a value
        sheet.set_cell_value_at(2, pos("Agent"), "  ").unwrap();
        sheet.set_cell_value_at(3, pos("Bill No."), "B-2").unwrap();

        let (rows, warnings) = rows_from_sheet(&sheet, schema, &FormulaSet::defaults());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            warnings,
            vec!["Sheet row 2: 1 cells beyond the last column were dropped".to_string()]
        );

        let first = &rows[0];
        assert_eq!(first.cell(schema, "MRN No."), Some(&RowCell::Computed(1)));
        assert_eq!(first.cell(schema, "Bags"), Some(&RowCell::Literal("120".into())));
        assert_eq!(
            first.cell(schema, "Bill Wt (Qtl)"),
            Some(&RowCell::Literal("52.25".into()))
        );
        assert_eq!(first.cell(schema, "Bill Basic Amt"), Some(&RowCell::Pending));
        assert_eq!(first.cell(schema, "Shortage"), Some(&RowCell::Pending));
        assert_eq!(first.cell(schema, "Agent"), Some(&RowCell::empty()));

        assert_eq!(rows[1].cell(schema, "Bill No."), Some(&RowCell::Literal("B-2".into())));
        assert_eq!(rows[1].cell(schema, "MRN No."), Some(&RowCell::empty()));
    }

    #[test]
    fn test_placeholder_in_input_column_stays_text() {
        assert_eq!(
            cell_from_value(CellValue::string(PLACEHOLDER), ColumnKind::RowInput, false),
            RowCell::Literal(PLACEHOLDER.into())
        );
        assert_eq!(
            cell_from_value(CellValue::formula("=1"), ColumnKind::RowInput, false),
            RowCell::Literal("=1".into())
        );
        assert_eq!(
            cell_from_value(CellValue::Number(2.5), ColumnKind::Formula, true),
            RowCell::Literal("2.5".into())
        );
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = Worksheet::new("Data").unwrap();
        let (rows, warnings) =
            rows_from_sheet(&sheet, ColumnSchema::bill(), &FormulaSet::defaults());
        assert!(rows.is_empty());
        assert!(warnings.is_empty());
    }
}
