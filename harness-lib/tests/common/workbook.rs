//! Minimal `.xlsx` writer for loader fixtures.
//!
//! Strings are stored inline, numbers as plain values and empty cells are
//! left out, so calamine sees the same sparse sheet a spreadsheet tool would
//! save.

use calamine::Data;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One sheet: its name and its rows, starting at A1
pub type Sheet<'a> = (&'a str, Vec<Vec<Data>>);

/// Write `dir/name` as an xlsx workbook holding `sheets` in order
pub fn write_xlsx(dir: &Path, name: &str, sheets: &[Sheet<'_>]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("workbook fixture should be writable");
    let mut zip = ZipWriter::new(file);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts = vec![
        ("[Content_Types].xml".to_string(), content_types(sheets.len())),
        ("_rels/.rels".to_string(), ROOT_RELS.to_string()),
        ("xl/workbook.xml".to_string(), workbook_xml(sheets)),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels(sheets.len())),
        ("xl/styles.xml".to_string(), STYLES.to_string()),
    ];
    for (idx, (_, rows)) in sheets.iter().enumerate() {
        parts.push((format!("xl/worksheets/sheet{}.xml", idx + 1), sheet_xml(rows)));
    }

    for (part, body) in parts {
        zip.start_file(part, options).expect("zip entry should start");
        zip.write_all(body.as_bytes()).expect("zip entry should be written");
    }
    zip.finish().expect("workbook fixture should be finalized");
    path
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs></styleSheet>"#;

fn content_types(sheet_count: usize) -> String {
    let overrides: String = (1..=sheet_count)
        .map(|n| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>{overrides}</Types>"#
    )
}

fn workbook_xml(sheets: &[Sheet<'_>]) -> String {
    let entries: String = sheets
        .iter()
        .enumerate()
        .map(|(idx, (name, _))| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                idx + 1,
                idx + 1
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{entries}</sheets></workbook>"#
    )
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut entries: String = (1..=sheet_count)
        .map(|n| {
            format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            )
        })
        .collect();
    entries.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{entries}</Relationships>"#
    )
}

fn sheet_xml(rows: &[Vec<Data>]) -> String {
    let mut data = String::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let cells: String = row
            .iter()
            .enumerate()
            .filter_map(|(col_idx, cell)| cell_xml(&cell_ref(row_idx, col_idx), cell))
            .collect();
        if !cells.is_empty() {
            data.push_str(&format!(r#"<row r="{}">{cells}</row>"#, row_idx + 1));
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
    )
}

fn cell_xml(reference: &str, cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(format!(
            r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape(s)
        )),
        Data::Int(i) => Some(format!(r#"<c r="{reference}"><v>{i}</v></c>"#)),
        Data::Float(f) => Some(format!(r#"<c r="{reference}"><v>{f}</v></c>"#)),
        Data::Bool(b) => Some(format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*b))),
        other => panic!("unsupported fixture cell {other:?}"),
    }
}

/// `A1`-style reference; fixtures stay within columns A..Z
fn cell_ref(row_idx: usize, col_idx: usize) -> String {
    assert!(col_idx < 26, "fixture sheets are limited to 26 columns");
    format!("{}{}", (b'A' + col_idx as u8) as char, row_idx + 1)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
