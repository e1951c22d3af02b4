//! Hidden rows of an xlsx file
//!
//! calamine does not expose row visibility, so the worksheet parts are read
//! directly: `xl/workbook.xml` names the sheets, the workbook relationships
//! map them to `xl/worksheets/*.xml`, and each `<row hidden="1">` there marks
//! a hidden row.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Hidden 1-based row numbers per sheet name
pub fn read_hidden_rows<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Vec<usize>>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open Excel file: {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Not an xlsx package: {}", path.display()))?;

    let sheets = parse_workbook_sheets(&read_part(&mut archive, WORKBOOK_PART)?)?;
    let targets = parse_worksheet_targets(&read_part(&mut archive, WORKBOOK_RELS_PART)?)?;

    let mut hidden = HashMap::new();
    for (name, rel_id) in sheets {
        let Some(target) = targets.get(&rel_id) else {
            continue;
        };
        let xml = read_part(&mut archive, &part_name(target))?;
        let rows = parse_hidden_rows(&xml)
            .with_context(|| format!("Failed to read row visibility of sheet: {}", name))?;
        if !rows.is_empty() {
            hidden.insert(name, rows);
        }
    }
    Ok(hidden)
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("Missing xlsx part: {}", name))?;
    let mut buf = Vec::new();
    part.read_to_end(&mut buf)
        .with_context(|| format!("Failed to read xlsx part: {}", name))?;
    Ok(buf)
}

/// Relationship targets are relative to `xl/` unless absolute
fn part_name(target: &str) -> String {
    let trimmed = target.trim_start_matches('/');
    if trimmed.starts_with("xl/") {
        trimmed.to_string()
    } else {
        format!("xl/{}", trimmed)
    }
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.context("Malformed XML attribute")?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value).context("XML attribute is not UTF-8")?;
            let value = quick_xml::escape::unescape(raw).context("Bad XML escape")?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// (sheet name, relationship id) in workbook order
fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("Malformed workbook.xml")? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name")?;
                let rel_id = attr_value(&e, b"r:id")?;
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name, rel_id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Relationship id -> worksheet target
fn parse_worksheet_targets(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf).context("Malformed workbook relationships")? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?;
                let target = attr_value(&e, b"Target")?;
                let is_worksheet = attr_value(&e, b"Type")?
                    .is_some_and(|t| t.ends_with("/worksheet"));
                if let (Some(id), Some(target), true) = (id, target, is_worksheet) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Row numbers carrying `hidden="1"` (or `"true"`) in a worksheet part
fn parse_hidden_rows(xml: &[u8]) -> Result<Vec<usize>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut rows = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("Malformed worksheet XML")? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"row" => {
                let hidden = attr_value(&e, b"hidden")?.is_some_and(|h| h == "1" || h == "true");
                if hidden
                    && let Some(row) = attr_value(&e, b"r")?.and_then(|r| r.parse::<usize>().ok())
                {
                    rows.push(row);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}
