//! Delimited-text and workbook serialization of filtered tables.
//!
//! Both writers are pure, order-preserving serializations of whatever row
//! set is passed in; filtering happens upstream.

use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::models::{Alert, AuditRecord, DeltaRow};

/// Export format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Which table to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportTable {
    Master,
    Alerts,
    Deltas,
}

impl ExportTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Alerts => "alerts",
            Self::Deltas => "deltas",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("workbook write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize rows as UTF-8 CSV with a header line.
pub fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut output = Vec::new();
    writeln!(output, "{}", headers.join(",")).ok();
    for row in rows {
        let line: Vec<String> = row.iter().map(|cell| escape_csv(cell)).collect();
        writeln!(output, "{}", line.join(",")).ok();
    }
    output
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Serialize rows as a single-sheet xlsx workbook with inline strings.
pub fn to_xlsx(
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer.start_file("[Content_Types].xml", options)?;
    writer.write_all(CONTENT_TYPES_XML.as_bytes())?;

    writer.start_file("_rels/.rels", options)?;
    writer.write_all(ROOT_RELS_XML.as_bytes())?;

    writer.start_file("xl/workbook.xml", options)?;
    writer.write_all(workbook_xml(sheet_name).as_bytes())?;

    writer.start_file("xl/_rels/workbook.xml.rels", options)?;
    writer.write_all(WORKBOOK_RELS_XML.as_bytes())?;

    writer.start_file("xl/worksheets/sheet1.xml", options)?;
    writer.write_all(sheet_xml(headers, rows).as_bytes())?;

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        escape_xml(sheet_name)
    )
}

fn sheet_xml(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    push_row(&mut xml, headers.iter().copied());
    for row in rows {
        push_row(&mut xml, row.iter().map(String::as_str));
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row<'a, I: Iterator<Item = &'a str>>(xml: &mut String, cells: I) {
    xml.push_str("<row>");
    for cell in cells {
        xml.push_str("<c t=\"inlineStr\"><is><t>");
        xml.push_str(&escape_xml(cell));
        xml.push_str("</t></is></c>");
    }
    xml.push_str("</row>");
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Column order used by the URL explorer export.
pub const MASTER_HEADERS: [&str; 13] = [
    "url",
    "meta_title",
    "categoria",
    "subcategoria",
    "tipo_contenido",
    "vigencia",
    "status_code",
    "has_product_carousel",
    "word_count",
    "h2_count",
    "has_alerts",
    "pub_date",
    "lastmod",
];

pub fn master_export_rows(rows: &[AuditRecord]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| {
            vec![
                r.url.clone(),
                r.meta_title.clone(),
                r.categoria.clone(),
                r.subcategoria.clone(),
                r.tipo_contenido.clone(),
                r.vigencia.as_str().to_string(),
                r.status_code.to_string(),
                r.has_product_carousel.to_string(),
                r.word_count.to_string(),
                r.h2_count.to_string(),
                r.has_alerts.to_string(),
                r.pub_date.clone(),
                r.lastmod.clone(),
            ]
        })
        .collect()
}

/// Column order used by the alerts panel export.
pub const ALERT_HEADERS: [&str; 6] = [
    "url",
    "alert_type",
    "severity",
    "detail",
    "detected_date",
    "resolved",
];

pub fn alert_export_rows(alerts: &[Alert]) -> Vec<Vec<String>> {
    alerts
        .iter()
        .map(|a| {
            vec![
                a.url.clone(),
                a.alert_type.clone(),
                a.severity.map(|s| s.as_str()).unwrap_or("").to_string(),
                a.detail.clone(),
                a.detected_date.clone(),
                a.resolved.to_string(),
            ]
        })
        .collect()
}

/// Column order used by the performance-deltas export.
pub const DELTA_HEADERS: [&str; 8] = [
    "url",
    "periodo",
    "clicks",
    "clicks_prev",
    "clicks_delta_pct",
    "impressions",
    "position",
    "position_delta",
];

pub fn delta_export_rows(deltas: &[DeltaRow]) -> Vec<Vec<String>> {
    deltas
        .iter()
        .map(|d| {
            vec![
                d.url.clone(),
                d.periodo.clone(),
                d.clicks.to_string(),
                d.clicks_prev.to_string(),
                d.clicks_delta_pct.to_string(),
                d.impressions.to_string(),
                d.position.to_string(),
                d.position_delta.to_string(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    #[test]
    fn csv_has_header_and_preserves_order() {
        let rows = vec![
            vec!["https://site/b".to_string(), "2".to_string()],
            vec!["https://site/a".to_string(), "1".to_string()],
        ];
        let bytes = to_csv(&["url", "count"], &rows);
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "url,count");
        assert_eq!(lines[1], "https://site/b,2");
        assert_eq!(lines[2], "https://site/a,1");
    }

    #[test]
    fn csv_escapes_delimiters_quotes_and_newlines() {
        let rows = vec![vec![
            "a,b".to_string(),
            "say \"hi\"".to_string(),
            "two\nlines".to_string(),
        ]];
        let bytes = to_csv(&["x", "y", "z"], &rows);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"a,b\""));
        assert!(text.contains("\"say \"\"hi\"\"\""));
        assert!(text.contains("\"two\nlines\""));
    }

    #[test]
    fn xlsx_is_a_valid_container_with_one_sheet() {
        let rows = vec![vec!["https://site/a".to_string(), "200".to_string()]];
        let bytes = to_xlsx("URLs", &["url", "status"], &rows).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"xl/workbook.xml".to_string()));
        assert!(names.contains(&"xl/worksheets/sheet1.xml".to_string()));

        let mut sheet = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("xl/worksheets/sheet1.xml").unwrap(),
            &mut sheet,
        )
        .unwrap();
        assert!(sheet.contains("<t>https://site/a</t>"));
        assert!(sheet.contains("<t>url</t>"));
    }

    #[test]
    fn xlsx_escapes_markup_in_cells() {
        let rows = vec![vec!["<b>&\"x\"</b>".to_string()]];
        let bytes = to_xlsx("Sheet", &["field"], &rows).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut sheet = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("xl/worksheets/sheet1.xml").unwrap(),
            &mut sheet,
        )
        .unwrap();
        assert!(sheet.contains("&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;"));
    }

    #[test]
    fn master_projection_matches_header_arity() {
        let rows = master_export_rows(&[AuditRecord::default()]);
        assert_eq!(rows[0].len(), MASTER_HEADERS.len());
    }

    #[test]
    fn alert_projection_handles_unknown_severity() {
        let rows = alert_export_rows(&[Alert::default()]);
        assert_eq!(rows[0].len(), ALERT_HEADERS.len());
        assert_eq!(rows[0][2], "");
    }
}
