//! Export of entered rows to an XLSX workbook
//!
//! Pending cells become real sheet formulas, resolved for the row they land
//! on. Literal cells that look like grouped numbers (`1,234.50`) are written
//! as numbers with the `#,##0.00` format; anything else stays text.

use std::fmt;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use weighbill_core::fs::atomic_write;
use weighbill_core::{
    parse_grouped_number, CellValue, ColumnSchema, MaterializedRow, RowCell, Style, Worksheet,
    HEADER_ROWS,
};
use weighbill_formula::{resolve, FormulaSet, Resolution};
use weighbill_xlsx::XlsxWriter;

use crate::error::{Error, Result};

/// Name of the single exported sheet
pub const SHEET_NAME: &str = "Data";

/// Narrowest column width on the exported sheet
pub const MIN_COLUMN_WIDTH: f64 = 15.0;

/// What to do with a formula that references unknown columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Write the formula with the unknown references left in place and
    /// report a warning
    #[default]
    Write,
    /// Fail the export
    Reject,
}

impl UnresolvedPolicy {
    /// Parse a policy name (`write` or `reject`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "write" => Some(UnresolvedPolicy::Write),
            "reject" => Some(UnresolvedPolicy::Reject),
            _ => None,
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Handling of partially resolved formulas
    pub unresolved: UnresolvedPolicy,
}

/// Something written differently from what the row asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// Formula written with unknown references left as bracketed text
    Unresolved {
        row: usize,
        column: String,
        names: Vec<String>,
    },
    /// Pending cell whose column has no formula; written empty
    MissingFormula { row: usize, column: String },
    /// Auto-increment value that differs from the row's position
    CounterMismatch {
        row: usize,
        column: String,
        value: i64,
    },
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::Unresolved { row, column, names } => {
                write!(f, "Row {row}, {column}: unknown references")?;
                for name in names {
                    write!(f, " [{name}]")?;
                }
                Ok(())
            }
            ExportWarning::MissingFormula { row, column } => {
                write!(f, "Row {row}, {column}: no formula defined, cell left empty")
            }
            ExportWarning::CounterMismatch { row, column, value } => write!(
                f,
                "Row {row}, {column}: counter {value} does not match the row position"
            ),
        }
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the workbook was written
    pub path: PathBuf,
    /// Number of data rows written
    pub rows: usize,
    /// Cells written differently from what the row asked for
    pub warnings: Vec<ExportWarning>,
}

/// Default export path: `<export_dir>/YYYYmmdd_HHMMSS.xlsx`
pub fn default_destination(export_dir: &Path, now: DateTime<Local>) -> PathBuf {
    export_dir.join(format!("{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

/// Build the export sheet without writing it
pub fn build_sheet(
    schema: &ColumnSchema,
    rows: &[MaterializedRow],
    formulas: &FormulaSet,
    options: &ExportOptions,
) -> Result<(Worksheet, Vec<ExportWarning>)> {
    let mut sheet = Worksheet::new(SHEET_NAME)?;
    let mut warnings = Vec::new();

    for (col, column) in schema.columns().iter().enumerate() {
        let col = col as u16;
        sheet.set_cell_styled_at(0, col, column.name.as_str(), Style::header())?;
        let width = (column.name.chars().count() + 2) as f64;
        sheet.set_column_width(col, width.max(MIN_COLUMN_WIDTH));
    }

    for (i, row) in rows.iter().enumerate() {
        let data_row = i + 1;
        let sheet_row = data_row as u32 - 1 + HEADER_ROWS;

        for (col, (column, cell)) in schema.columns().iter().zip(row.cells()).enumerate() {
            let col = col as u16;
            match cell {
                RowCell::Pending => match formulas.expression(&column.name) {
                    Some(expression) => {
                        let resolution = resolve(expression, schema, data_row as u32);
                        if let Resolution::PartiallyResolved { unresolved, .. } = &resolution {
                            if options.unresolved == UnresolvedPolicy::Reject {
                                return Err(Error::Unresolved {
                                    row: data_row,
                                    column: column.name.clone(),
                                    unresolved: unresolved.clone(),
                                });
                            }
                            log::warn!(
                                "Row {}, {}: writing formula with unresolved references {:?}",
                                data_row,
                                column.name,
                                unresolved
                            );
                            warnings.push(ExportWarning::Unresolved {
                                row: data_row,
                                column: column.name.clone(),
                                names: unresolved.clone(),
                            });
                        }
                        let formula = resolution.into_formula();
                        if formula.starts_with('=') {
                            sheet.set_cell_styled_at(
                                sheet_row,
                                col,
                                CellValue::formula(formula),
                                Style::two_decimals(),
                            )?;
                        } else {
                            write_literal(&mut sheet, sheet_row, col, &formula)?;
                        }
                    }
                    None => {
                        log::warn!(
                            "Row {}, {}: pending cell has no formula",
                            data_row,
                            column.name
                        );
                        warnings.push(ExportWarning::MissingFormula {
                            row: data_row,
                            column: column.name.clone(),
                        });
                    }
                },
                RowCell::Computed(value) => {
                    let auto_increment = formulas
                        .get(&column.name)
                        .map_or(false, |def| def.is_auto_increment());
                    if auto_increment && *value != data_row as i64 {
                        log::warn!(
                            "Row {}, {}: counter {} does not match the row position",
                            data_row,
                            column.name,
                            value
                        );
                        warnings.push(ExportWarning::CounterMismatch {
                            row: data_row,
                            column: column.name.clone(),
                            value: *value,
                        });
                    }
                    sheet.set_cell_value_at(sheet_row, col, *value)?;
                }
                RowCell::Literal(text) => write_literal(&mut sheet, sheet_row, col, text)?,
            }
        }
    }

    Ok((sheet, warnings))
}

fn write_literal(sheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    match parse_grouped_number(text) {
        Some(n) => sheet.set_cell_styled_at(row, col, n, Style::two_decimals())?,
        None => sheet.set_cell_value_at(row, col, text)?,
    }
    Ok(())
}

/// Export `rows` to `destination`
///
/// The workbook is written to a temp file beside the destination and
/// renamed into place, so a failure leaves any existing file unchanged.
pub fn export(
    schema: &ColumnSchema,
    rows: &[MaterializedRow],
    formulas: &FormulaSet,
    destination: &Path,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let (sheet, warnings) = build_sheet(schema, rows, formulas, options)?;

    atomic_write(destination, |file| XlsxWriter::write(&sheet, BufWriter::new(file))).map_err(
        |source| Error::Write {
            path: destination.to_path_buf(),
            source,
        },
    )?;

    log::info!(
        "Exported {} rows to {} ({} warnings)",
        rows.len(),
        destination.display(),
        warnings.len()
    );
    Ok(ExportReport {
        path: destination.to_path_buf(),
        rows: rows.len(),
        warnings,
    })
}
