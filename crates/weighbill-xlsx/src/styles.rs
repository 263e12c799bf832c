//! XLSX styles (styles.xml) read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use weighbill_core::{HorizontalAlignment, NumberFormat, Style, Worksheet};

// === Writing ===

#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Deduplicated styles. Index corresponds to the cellXfs index (xfId).
    styles: Vec<Style>,
    /// Style -> xfId
    style_to_xf: HashMap<Style, u32>,
}

impl XlsxStyleTable {
    pub(crate) fn build(sheet: &Worksheet) -> Self {
        let mut styles: Vec<Style> = Vec::new();
        let mut style_to_xf: HashMap<Style, u32> = HashMap::new();

        // Index 0 is always default style
        let default = Style::default();
        styles.push(default.clone());
        style_to_xf.insert(default, 0);

        for (_addr, cell) in sheet.iter_cells() {
            if !style_to_xf.contains_key(&cell.style) {
                let id = styles.len() as u32;
                styles.push(cell.style.clone());
                style_to_xf.insert(cell.style.clone(), id);
            }
        }

        Self {
            styles,
            style_to_xf,
        }
    }

    pub(crate) fn xf_id_for(&self, style: &Style) -> u32 {
        self.style_to_xf.get(style).copied().unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        // Fonts: 0 is regular, 1 is bold (only emitted when used)
        let needs_bold = self.styles.iter().any(|s| s.bold);

        // Custom number formats
        let mut numfmt_ids: HashMap<String, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, String)> = Vec::new();
        let mut next_numfmt_id: u32 = NumberFormat::FIRST_CUSTOM_ID;

        let mut num_fmt_ids: Vec<u32> = Vec::with_capacity(self.styles.len());
        for style in &self.styles {
            let id = match &style.number_format {
                NumberFormat::General => NumberFormat::ID_GENERAL,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(code) => {
                    if let Some(&id) = numfmt_ids.get(code) {
                        id
                    } else {
                        let id = next_numfmt_id;
                        next_numfmt_id += 1;
                        numfmt_ids.insert(code.clone(), id);
                        numfmts.push((id, code.clone()));
                        id
                    }
                }
            };
            num_fmt_ids.push(id);
        }

        let mut xml = String::new();
        xml.push_str(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        // Fonts
        let font_count = if needs_bold { 2 } else { 1 };
        xml.push_str(&format!("\n  <fonts count=\"{}\">", font_count));
        xml.push_str("\n    <font><sz val=\"11\"/><name val=\"Calibri\"/></font>");
        if needs_bold {
            xml.push_str("\n    <font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>");
        }
        xml.push_str("\n  </fonts>");

        // Fills: Excel requires the first two to be none and gray125
        xml.push_str(
            r#"
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
  </fills>
  <borders count="1">
    <border><left/><right/><top/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        // cellXfs
        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.styles.len()));
        for (style, num_fmt_id) in self.styles.iter().zip(num_fmt_ids) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, num_fmt_id));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
        );
        xml
    }
}

pub(crate) fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn horiz_to_str(h: HorizontalAlignment) -> &'static str {
    match h {
        HorizontalAlignment::General => "general",
        HorizontalAlignment::Left => "left",
        HorizontalAlignment::Center => "center",
        HorizontalAlignment::Right => "right",
    }
}

fn write_xf(style: &Style, num_fmt_id: u32) -> String {
    let font_id = if style.bold { 1 } else { 0 };

    let mut attrs = String::new();
    if num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if style.bold {
        attrs.push_str(" applyFont=\"1\"");
    }
    if style.horizontal != HorizontalAlignment::General {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"0\" borderId=\"0\" xfId=\"0\"{}",
        num_fmt_id, font_id, attrs
    );

    if style.horizontal == HorizontalAlignment::General {
        s.push_str("/>");
        return s;
    }

    s.push_str(&format!(
        "><alignment horizontal=\"{}\"/></xf>",
        horiz_to_str(style.horizontal)
    ));
    s
}

// === Reading ===

/// Parse styles.xml into one [`Style`] per cellXfs entry
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut numfmts: HashMap<u32, String> = HashMap::new();
    let mut bold_fonts: Vec<bool> = Vec::new();
    let mut cell_xfs: Vec<Style> = Vec::new();

    let mut in_font = false;
    let mut in_cell_xfs = false;
    let mut current_xf: Option<Style> = None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"font" => {
                    in_font = true;
                    bold_fonts.push(false);
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    current_xf = Some(parse_xf_attrs(&e, &numfmts, &bold_fonts));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => {
                                id = attr
                                    .unescape_value()
                                    .ok()
                                    .and_then(|s| s.parse::<u32>().ok());
                            }
                            b"formatCode" => {
                                code = attr.unescape_value().ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        numfmts.insert(id, code);
                    }
                }
                b"b" if in_font => {
                    let bold = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"val")
                        .and_then(|a| a.unescape_value().ok().map(|v| v != "0" && v != "false"))
                        .unwrap_or(true);
                    if let Some(last) = bold_fonts.last_mut() {
                        *last = bold;
                    }
                }
                b"font" => bold_fonts.push(false),
                b"xf" if in_cell_xfs => {
                    cell_xfs.push(parse_xf_attrs(&e, &numfmts, &bold_fonts));
                }
                b"alignment" => {
                    if let Some(xf) = current_xf.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"horizontal" {
                                if let Ok(v) = attr.unescape_value() {
                                    xf.horizontal = str_to_horizontal(&v);
                                }
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"font" => in_font = false,
                b"cellXfs" => in_cell_xfs = false,
                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        cell_xfs.push(xf);
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

    if cell_xfs.is_empty() {
        cell_xfs.push(Style::default());
    }
    Ok(cell_xfs)
}

fn parse_xf_attrs(e: &BytesStart<'_>, numfmts: &HashMap<u32, String>, bold_fonts: &[bool]) -> Style {
    let mut style = Style::default();
    for attr in e.attributes().flatten() {
        let Ok(value) = attr.unescape_value() else {
            continue;
        };
        match attr.key.as_ref() {
            b"numFmtId" => {
                if let Ok(id) = value.parse::<u32>() {
                    style.number_format = match numfmts.get(&id) {
                        Some(code) => NumberFormat::Custom(code.clone()),
                        None if id == NumberFormat::ID_GENERAL => NumberFormat::General,
                        None => NumberFormat::BuiltIn(id),
                    };
                }
            }
            b"fontId" => {
                if let Ok(id) = value.parse::<usize>() {
                    style.bold = bold_fonts.get(id).copied().unwrap_or(false);
                }
            }
            _ => {}
        }
    }
    style
}

fn str_to_horizontal(s: &str) -> HorizontalAlignment {
    match s {
        "left" => HorizontalAlignment::Left,
        "center" | "centerContinuous" => HorizontalAlignment::Center,
        "right" => HorizontalAlignment::Right,
        _ => HorizontalAlignment::General,
    }
}
