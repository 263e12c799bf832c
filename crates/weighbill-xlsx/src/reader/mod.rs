//! XLSX reader
//!
//! Reads the first sheet of a workbook: cell values (shared strings, inline
//! strings, numbers, booleans), formula text, cell styles and column widths.
//! Cached formula results are dropped; a formula cell comes back as its text.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use weighbill_core::{CellAddress, CellValue, Style, Worksheet};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }

        let mut hex_chars = String::new();
        let mut decoded = None;
        let saw_x = chars.peek() == Some(&'x');

        if saw_x {
            chars.next();
            while hex_chars.len() < 4 {
                match chars.peek() {
                    Some(&ch) if ch.is_ascii_hexdigit() => {
                        hex_chars.push(ch);
                        chars.next();
                    }
                    _ => break,
                }
            }
            if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                chars.next();
                decoded = u32::from_str_radix(&hex_chars, 16)
                    .ok()
                    .and_then(char::from_u32);
            }
        }

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                // Not a valid escape sequence, output what we consumed
                result.push('_');
                if saw_x {
                    result.push('x');
                    result.push_str(&hex_chars);
                }
            }
        }
    }

    result
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read the first sheet of a workbook file
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Worksheet> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read the first sheet of a workbook
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Worksheet> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::NotAWorkbook(
                "missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let cell_styles = Self::read_styles(&mut archive)?;

        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let (name, r_id) = sheet_info
            .into_iter()
            .next()
            .ok_or_else(|| XlsxError::NotAWorkbook("workbook has no sheets".into()))?;
        let path = sheet_paths
            .get(&r_id)
            .ok_or_else(|| XlsxError::MissingPart(format!("worksheet for {}", r_id)))?;

        let mut worksheet = Worksheet::new(name)?;
        Self::read_worksheet(
            &mut archive,
            path,
            &mut worksheet,
            &shared_strings,
            &cell_styles,
        )?;

        log::debug!(
            "Read sheet '{}' ({} cells) from {}",
            worksheet.name(),
            worksheet.cell_count(),
            path
        );
        Ok(worksheet)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // String items keep their surrounding whitespace
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<Style>> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(vec![Style::default()]),
        }
    }

    /// Read workbook.xml to get sheet names and rIds, in tab order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let name = attr_value(&e, b"name");
                    let r_id = attr_value(&e, b"r:id");
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Style],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Cell text keeps its surrounding whitespace
        xml_reader.trim_text(false);

        let mut buf = Vec::new();

        // Current cell state
        let mut current_cell_ref: Option<String> = None;
        let mut current_cell_type: Option<String> = None;
        let mut current_cell_style: Option<u32> = None;
        let mut current_value: Option<String> = None;
        let mut current_formula: Option<String> = None;
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"c" => {
                        in_cell = true;
                        current_cell_ref = attr_value(&e, b"r");
                        current_cell_type = attr_value(&e, b"t");
                        current_cell_style =
                            attr_value(&e, b"s").and_then(|s| s.parse::<u32>().ok());
                        current_value = None;
                        current_formula = None;
                    }
                    b"v" if in_cell => in_value = true,
                    b"f" if in_cell => in_formula = true,
                    b"is" if in_cell => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(ref cell_ref) = current_cell_ref {
                            Self::process_cell(
                                worksheet,
                                cell_ref,
                                current_cell_type.as_deref(),
                                current_value.as_deref(),
                                current_formula.as_deref(),
                                current_cell_style,
                                shared_strings,
                                cell_styles,
                            )?;
                        }
                        in_cell = false;
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"is" => in_inline_str = false,
                    b"t" if in_inline_str => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let target = if in_value {
                        Some(&mut current_value)
                    } else if in_formula {
                        Some(&mut current_formula)
                    } else if in_inline_text {
                        current_cell_type = Some("inlineStr".to_string());
                        Some(&mut current_value)
                    } else {
                        None
                    };
                    if let Some(target) = target {
                        if let Ok(text) = e.unescape() {
                            target.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"col" => Self::apply_column_width(worksheet, &e),
                    b"c" => {
                        // Empty cell element (may still carry a style)
                        let cell_ref = attr_value(&e, b"r");
                        let style = attr_value(&e, b"s").and_then(|s| s.parse::<u32>().ok());
                        if let Some(cell_ref) = cell_ref {
                            Self::process_cell(
                                worksheet,
                                &cell_ref,
                                None,
                                None,
                                None,
                                style,
                                shared_strings,
                                cell_styles,
                            )?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn apply_column_width(worksheet: &mut Worksheet, e: &BytesStart<'_>) {
        let col_min = attr_value(e, b"min").and_then(|s| s.parse::<u16>().ok());
        let col_max = attr_value(e, b"max").and_then(|s| s.parse::<u16>().ok());
        let width = attr_value(e, b"width").and_then(|s| s.parse::<f64>().ok());
        let custom = attr_value(e, b"customWidth").map_or(false, |s| s == "1" || s == "true");

        if let (Some(min), Some(max), Some(width), true) = (col_min, col_max, width, custom) {
            // min/max are 1-based in XLSX
            for col in min..=max {
                worksheet.set_column_width(col.saturating_sub(1), width);
            }
        }
    }

    /// Process a cell and add it to the worksheet
    #[allow(clippy::too_many_arguments)]
    fn process_cell(
        worksheet: &mut Worksheet,
        cell_ref: &str,
        cell_type: Option<&str>,
        value: Option<&str>,
        formula: Option<&str>,
        style_idx: Option<u32>,
        shared_strings: &[String],
        styles: &[Style],
    ) -> XlsxResult<()> {
        let addr =
            CellAddress::parse(cell_ref).map_err(|e| XlsxError::bad_cell(cell_ref, e.to_string()))?;

        let cell_value = if let Some(f) = formula {
            CellValue::formula(f)
        } else if let Some(value) = value {
            match cell_type {
                // Shared string
                Some("s") => {
                    let idx: usize = value.parse().map_err(|_| {
                        let message = format!("invalid shared string index {}", value);
                        XlsxError::bad_cell(cell_ref, message)
                    })?;
                    let s = shared_strings.get(idx).ok_or_else(|| {
                        let message = format!("shared string {} does not exist", idx);
                        XlsxError::bad_cell(cell_ref, message)
                    })?;
                    CellValue::String(s.clone())
                }

                Some("b") => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),

                Some("inlineStr") | Some("str") => CellValue::String(decode_excel_escapes(value)),

                None | Some("n") => match value.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::String(value.to_string()),
                },

                // Errors and unknown types keep their text
                Some(_) => CellValue::String(value.to_string()),
            }
        } else {
            CellValue::Empty
        };

        let style = match style_idx {
            Some(s) if s != 0 => styles
                .get(s as usize)
                .cloned()
                .ok_or_else(|| {
                    XlsxError::bad_cell(cell_ref, format!("style {} does not exist", s))
                })?,
            _ => Style::default(),
        };

        if style.is_default() {
            worksheet.set_cell_value_at(addr.row, addr.col, cell_value)?;
        } else {
            worksheet.set_cell_styled_at(addr.row, addr.col, cell_value, style)?;
        }

        Ok(())
    }
}

/// Unescaped value of one attribute
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("a_x000d_b"), "a\rb");
        assert_eq!(decode_excel_escapes("_x005f_x000d_"), "_x000d_");
        assert_eq!(decode_excel_escapes("no escapes"), "no escapes");
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("a_b"), "a_b");
        assert_eq!(decode_excel_escapes("_xyz"), "_xyz");
    }

    fn minimal_xlsx(sheet_xml: &str, shared_strings: Option<&str>) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();

            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Bills" sheetId="1" r:id="rId1"/><sheet name="Other" sheetId="2" r:id="rId2"/></sheets></workbook>"#).unwrap();

            zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            zip.write_all(sheet_xml.as_bytes()).unwrap();

            zip.start_file("xl/worksheets/sheet2.xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1"><v>99</v></c></row></sheetData></worksheet>"#).unwrap();

            if let Some(sst) = shared_strings {
                zip.start_file("xl/sharedStrings.xml", options).unwrap();
                zip.write_all(sst.as_bytes()).unwrap();
            }

            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_reads_first_sheet_values() {
        let sheet = r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t>Bags &amp; Wt</t></is></c></row>
            <row r="2"><c r="A2"><v>1234.5</v></c><c r="B2"><f>A2*2</f><v>2469</v></c><c r="C2" t="b"><v>1</v></c><c r="D2" t="e"><v>#DIV/0!</v></c></row>
        </sheetData></worksheet>"#;
        let sst = r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1"><si><t>Bill No.</t></si></sst>"#;

        let ws = XlsxReader::read(Cursor::new(minimal_xlsx(sheet, Some(sst)))).unwrap();
        assert_eq!(ws.name(), "Bills");
        assert_eq!(ws.get_value_at(0, 0), CellValue::string("Bill No."));
        assert_eq!(ws.get_value_at(0, 1), CellValue::string("Bags & Wt"));
        assert_eq!(ws.get_value_at(1, 0), CellValue::Number(1234.5));
        assert_eq!(ws.get_value_at(1, 1), CellValue::formula("=A2*2"));
        assert_eq!(ws.get_value_at(1, 2), CellValue::Boolean(true));
        assert_eq!(ws.get_value_at(1, 3), CellValue::string("#DIV/0!"));
        assert_eq!(ws.max_row(), Some(1));
    }

    #[test]
    fn test_bad_shared_string_index() {
        let sheet = r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>5</v></c></row></sheetData></worksheet>"#;
        let err = XlsxReader::read(Cursor::new(minimal_xlsx(sheet, None))).unwrap_err();
        assert!(matches!(err, XlsxError::BadCell { .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let err = XlsxReader::read(Cursor::new(b"not a workbook".to_vec())).unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }
}
