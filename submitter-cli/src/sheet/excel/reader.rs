//! Read sheets from an xlsx file

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use log::debug;

use super::visibility::read_hidden_rows;
use crate::sheet::{Sheet, Workbook};

/// Convert an Excel cell to the text a user sees in it
pub(crate) fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Whole numbers lose the trailing ".0"
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Read every sheet of an xlsx workbook
pub fn read_workbook_xlsx<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    let mut hidden_rows = read_hidden_rows(path)?;

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

        let mut sheet = Sheet::new(&sheet_name);
        // The range starts at the first used cell, not necessarily A1
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (r, row) in range.rows().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let text = cell_to_text(cell);
                if text.is_empty() {
                    continue;
                }
                sheet.set_cell(
                    start_row as usize + r + 1,
                    start_col as usize + c + 1,
                    text,
                );
            }
        }

        let hidden = hidden_rows.remove(&sheet_name).unwrap_or_default();
        for &row in &hidden {
            sheet.set_row_hidden(row, true);
        }

        debug!(
            "Read sheet '{}' ({} rows x {} columns, {} hidden)",
            sheet_name,
            sheet.last_row(),
            sheet.last_column(),
            hidden.len()
        );
        sheets.push(sheet);
    }

    Ok(Workbook::new(sheets))
}
