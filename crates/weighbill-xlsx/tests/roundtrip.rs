//! Write a bill-shaped sheet to disk and read it back.

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weighbill_core::{fs::atomic_write, CellValue, NumberFormat, Style, Worksheet};
use weighbill_xlsx::{XlsxError, XlsxReader, XlsxWriter};

fn bill_sheet() -> Worksheet {
    let mut ws = Worksheet::new("Data").unwrap();
    for (col, header) in ["Bill No.", "Bags", "Bill Wt (Qtl)", "Total"].iter().enumerate() {
        ws.set_cell_styled_at(0, col as u16, *header, Style::header())
            .unwrap();
        ws.set_column_width(col as u16, 15.0);
    }
    ws.set_cell_value_at(1, 0, "ABC123").unwrap();
    ws.set_cell_styled_at(1, 1, 1234.5, Style::two_decimals())
        .unwrap();
    ws.set_cell_styled_at(1, 2, 52.25, Style::two_decimals())
        .unwrap();
    ws.set_cell_value_at(1, 3, CellValue::formula("=ROUND(B2 * C2, 0)"))
        .unwrap();
    ws.set_cell_value_at(2, 0, "  padded  ").unwrap();
    ws.set_cell_value_at(2, 1, CellValue::formula("=ROW()-1"))
        .unwrap();
    ws
}

#[test]
fn test_round_trip_values_styles_and_widths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bills.xlsx");
    let original = bill_sheet();

    XlsxWriter::write_file(&original, &path).unwrap();
    let read = XlsxReader::read_file(&path).unwrap();

    assert_eq!(read.name(), "Data");
    assert_eq!(read.cell_count(), original.cell_count());
    for (addr, cell) in original.iter_cells() {
        let back = read.cell_at(addr.row, addr.col).unwrap();
        assert_eq!(back, cell, "cell {}", addr);
    }
    assert_eq!(read.column_width(3), 15.0);
    assert_eq!(read.dimension(), "A1:D3");
}

#[test]
fn test_number_format_survives() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("formats.xlsx");

    let mut ws = Worksheet::new("Data").unwrap();
    let custom = Style {
        number_format: NumberFormat::Custom("0.000".into()),
        ..Style::default()
    };
    ws.set_cell_styled_at(0, 0, 1.5, custom.clone()).unwrap();
    ws.set_cell_styled_at(1, 0, 2.5, Style::two_decimals())
        .unwrap();

    atomic_write(&path, |file| XlsxWriter::write(&ws, file)).unwrap();
    let read = XlsxReader::read_file(&path).unwrap();

    assert_eq!(read.cell_at(0, 0).unwrap().style, custom);
    assert_eq!(
        read.cell_at(1, 0).unwrap().style.number_format,
        NumberFormat::BuiltIn(NumberFormat::ID_NUMBER_SEP_DEC2)
    );
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = XlsxReader::read_file(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, XlsxError::Io(_)));
}
