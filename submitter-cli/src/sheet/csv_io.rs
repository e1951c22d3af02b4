//! CSV I/O for single-sheet workbooks

use std::path::Path;

use anyhow::{Context, Result};

use super::{Sheet, Workbook};

/// Read a CSV file as a one-sheet workbook named after the file stem
pub fn read_workbook_csv<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    Ok(Workbook::new(vec![Sheet::from_rows(name, rows)]))
}

/// Write the first sheet of a workbook as CSV. Formatting and hidden rows are not kept.
pub fn write_workbook_csv<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    if let Some(sheet) = workbook.sheets().first() {
        let width = sheet.last_column();
        for row in sheet.rows() {
            let mut cells = row.clone();
            cells.resize(width, String::new());
            writer.write_record(&cells)?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}
