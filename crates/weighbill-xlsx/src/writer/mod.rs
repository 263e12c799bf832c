//! XLSX writer

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::error::XlsxResult;
use crate::styles::{escape_xml_attr, XlsxStyleTable};
use weighbill_core::{CellValue, Worksheet};

type Zip<W> = zip::ZipWriter<W>;

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a single-sheet workbook to a file path
    ///
    /// The file is created or truncated in place. Use
    /// [`weighbill_core::fs::atomic_write`] with [`XlsxWriter::write`] when the
    /// destination must never be left half-written.
    pub fn write_file<P: AsRef<Path>>(sheet: &Worksheet, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(sheet, BufWriter::new(file))
    }

    /// Write a single-sheet workbook to a writer
    pub fn write<W: Write + Seek>(sheet: &Worksheet, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        let style_table = XlsxStyleTable::build(sheet);

        Self::write_content_types(&mut zip)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, sheet)?;
        Self::write_workbook_rels(&mut zip)?;
        Self::write_styles_xml(&mut zip, &style_table)?;
        Self::write_worksheet(&mut zip, sheet, &style_table)?;

        let mut inner = zip.finish()?;
        inner.flush()?;
        log::debug!(
            "Wrote sheet '{}' ({} cells, range {})",
            sheet.name(),
            sheet.cell_count(),
            sheet.dimension()
        );
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(zip: &mut Zip<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut Zip<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(zip: &mut Zip<W>, sheet: &Worksheet) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        // fullCalcOnLoad makes the opening application compute every formula
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>
        <sheet name="{}" sheetId="1" r:id="rId1"/>
    </sheets>
    <calcPr calcId="191029" fullCalcOnLoad="1"/>
</workbook>"#,
            escape_xml_attr(sheet.name())
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(zip: &mut Zip<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_styles_xml<W: Write + Seek>(
        zip: &mut Zip<W>,
        style_table: &XlsxStyleTable,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/styles.xml", options)?;
        let xml = style_table.to_styles_xml();
        zip.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut Zip<W>,
        sheet: &Worksheet,
        style_table: &XlsxStyleTable,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/worksheets/sheet1.xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        content.push_str(&format!("\n    <dimension ref=\"{}\"/>", sheet.dimension()));

        // Column widths, one <col> per customised column
        let widths = sheet.custom_column_widths();
        if !widths.is_empty() {
            content.push_str("\n    <cols>");
            for (col, width) in widths {
                content.push_str(&format!(
                    "\n        <col min=\"{}\" max=\"{}\" width=\"{}\" customWidth=\"1\"/>",
                    col + 1,
                    col + 1,
                    width
                ));
            }
            content.push_str("\n    </cols>");
        }

        content.push_str("\n    <sheetData>");

        // Write cell data (sparse, row-major)
        let mut current_row: Option<u32> = None;
        for (addr, cell) in sheet.iter_cells() {
            if current_row != Some(addr.row) {
                if current_row.is_some() {
                    content.push_str("\n        </row>");
                }
                content.push_str(&format!("\n        <row r=\"{}\">", addr.row + 1));
                current_row = Some(addr.row);
            }

            let cell_ref = addr.to_a1_string();

            let xf_id = style_table.xf_id_for(&cell.style);
            let style_attr = if xf_id != 0 {
                format!(" s=\"{}\"", xf_id)
            } else {
                String::new()
            };

            match &cell.value {
                CellValue::Number(n) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{}><v>{}</v></c>",
                        cell_ref, style_attr, n
                    ));
                }
                CellValue::String(s) => {
                    let space = if s.trim().len() != s.len() {
                        " xml:space=\"preserve\""
                    } else {
                        ""
                    };
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t{}>{}</t></is></c>",
                        cell_ref,
                        style_attr,
                        space,
                        Self::escape_xml(s)
                    ));
                }
                CellValue::Boolean(b) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                        cell_ref,
                        style_attr,
                        if *b { 1 } else { 0 }
                    ));
                }
                CellValue::Formula { text } => {
                    let formula_text = text.strip_prefix('=').unwrap_or(text.as_str());
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{}><f>{}</f></c>",
                        cell_ref,
                        style_attr,
                        Self::escape_xml(formula_text)
                    ));
                }
                CellValue::Empty => {
                    // Preserve style-only cells
                    if xf_id != 0 {
                        content.push_str(&format!(
                            "\n            <c r=\"{}\"{}/>",
                            cell_ref, style_attr
                        ));
                    }
                }
            }
        }

        if current_row.is_some() {
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Escape special XML characters
    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}
