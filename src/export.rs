//! Report downloads, built from rows that are already loaded.

use crate::{
    data::report::ReportRow,
    error::{CsvSnafu, IoSnafu, VaxResult, ZipSnafu},
    maud_conveniences::escape,
};
use snafu::ResultExt;
use std::io::{Cursor, Write};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub const HEADER: [&str; 4] = ["Vaccine Name", "Vaccination Date", "Drive Date", "Drive ID"];
pub const SHEET_NAME: &str = "Report";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "excel" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "vaccination_report.csv",
            Self::Xlsx => "vaccination_report.xlsx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// `None` when there's nothing to put in the file.
    pub fn render(self, rows: &[ReportRow]) -> VaxResult<Option<Vec<u8>>> {
        if rows.is_empty() {
            return Ok(None);
        }
        match self {
            Self::Csv => csv_report(rows),
            Self::Xlsx => xlsx_report(rows),
        }
        .map(Some)
    }
}

pub fn csv_report(rows: &[ReportRow]) -> VaxResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    writer.write_record(HEADER).context(CsvSnafu)?;
    for row in rows {
        writer.write_record(row.export_cells()).context(CsvSnafu)?;
    }

    writer
        .into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .context(IoSnafu)
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

/// Control characters other than tab/newline aren't allowed in XML at all.
fn cell_text(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(printable).0
}

fn sheet(rows: &[ReportRow]) -> String {
    const COLUMNS: [char; 4] = ['A', 'B', 'C', 'D'];

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header = HEADER.map(String::from);
    let all_rows = std::iter::once(header).chain(rows.iter().map(ReportRow::export_cells));
    for (i, cells) in all_rows.enumerate() {
        let row_number = i + 1;
        xml.push_str(&format!(r#"<row r="{row_number}">"#));
        for (column, cell) in COLUMNS.iter().zip(cells) {
            if cell.is_empty() {
                continue;
            }
            xml.push_str(&format!(
                r#"<c r="{column}{row_number}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                cell_text(&cell)
            ));
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// A single-sheet workbook with every cell as an inline string.
pub fn xlsx_report(rows: &[ReportRow]) -> VaxResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(vec![]));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet(rows)),
    ];
    for (name, contents) in parts {
        zip.start_file(name, options).context(ZipSnafu)?;
        zip.write_all(contents.as_bytes()).context(IoSnafu)?;
    }

    Ok(zip.finish().context(ZipSnafu)?.into_inner())
}
