//! In-memory sheet grid
//!
//! Rows and columns are 1-based, matching spreadsheet addressing. Row
//! [`HEADER_ROW`] holds property names; every row below it is a data row.
//! Cells are text; reading outside the grid yields an empty string and writing
//! outside it grows the grid.

use std::collections::BTreeSet;

use super::columns::{HEADER_COMMENTED_PROP_SKIP, normalize_header};
use super::template::HeaderStyle;

/// Row holding the property names
pub const HEADER_ROW: usize = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: Vec<Vec<String>>,
    hidden_rows: BTreeSet<usize>,
    /// Header formatting from the last profile application
    header_styles: Vec<HeaderStyle>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a sheet from rows of text, the first being the header
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let cells = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            name: name.into(),
            cells,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last row index in use (0 for an empty sheet)
    pub fn last_row(&self) -> usize {
        self.cells.len()
    }

    /// Last column index in use across all rows
    pub fn last_column(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Text of a cell; empty when outside the grid
    pub fn cell(&self, row: usize, col: usize) -> &str {
        if row == 0 || col == 0 {
            return "";
        }
        self.cells
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Write a cell, growing the grid as needed
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        assert!(row > 0 && col > 0, "sheet addressing is 1-based");
        if self.cells.len() < row {
            self.cells.resize_with(row, Vec::new);
        }
        let cells = &mut self.cells[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.into();
    }

    /// Header cells as (column, text), left to right, including empty headers
    pub fn header(&self) -> Vec<(usize, &str)> {
        (1..=self.last_column())
            .map(|col| (col, self.cell(HEADER_ROW, col).trim()))
            .collect()
    }

    /// Non-empty header names
    pub fn header_names(&self) -> Vec<&str> {
        self.header()
            .into_iter()
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Find a column by header text, tolerant to case and whitespace.
    /// With duplicate headers the last match wins.
    pub fn find_column_by_header(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        if wanted.is_empty() {
            return None;
        }
        self.header()
            .into_iter()
            .filter(|(_, header)| normalize_header(header) == wanted)
            .map(|(col, _)| col)
            .last()
    }

    /// Find a control column by its exact (case-sensitive) header text
    pub fn find_control_column(&self, name: &str) -> Option<usize> {
        self.header()
            .into_iter()
            .filter(|(_, header)| *header == name)
            .map(|(col, _)| col)
            .last()
    }

    /// Column of a control header, appending it to the header row when missing
    pub fn ensure_control_column(&mut self, name: &str) -> usize {
        match self.find_control_column(name) {
            Some(col) => col,
            None => self.append_header(name),
        }
    }

    /// Append a header cell after the last non-empty one
    pub fn append_header(&mut self, name: &str) -> usize {
        let col = self
            .header()
            .into_iter()
            .filter(|(_, header)| !header.is_empty())
            .map(|(col, _)| col)
            .max()
            .unwrap_or(0)
            + 1;
        self.set_cell(HEADER_ROW, col, name);
        col
    }

    pub fn is_row_hidden(&self, row: usize) -> bool {
        self.hidden_rows.contains(&row)
    }

    pub fn set_row_hidden(&mut self, row: usize, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub fn hidden_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.hidden_rows.iter().copied()
    }

    fn is_row_empty(&self, row: usize) -> bool {
        self.cells
            .get(row - 1)
            .is_none_or(|cells| cells.iter().all(|c| c.trim().is_empty()))
    }

    /// Data rows with any content, top to bottom
    pub fn data_rows(&self, ignore_hidden_rows: bool) -> Vec<usize> {
        (HEADER_ROW + 1..=self.last_row())
            .filter(|&row| !self.is_row_empty(row))
            .filter(|&row| !(ignore_hidden_rows && self.is_row_hidden(row)))
            .collect()
    }

    /// Number of data rows (metadata objects) on the sheet
    pub fn num_metadata_rows(&self, ignore_hidden_rows: bool) -> usize {
        self.data_rows(ignore_hidden_rows).len()
    }

    /// Is the row's skip flag set? Accepts the boolean literals "1"/"true".
    pub fn is_row_skipped(&self, row: usize) -> bool {
        self.find_control_column(HEADER_COMMENTED_PROP_SKIP)
            .is_some_and(|col| {
                matches!(
                    self.cell(row, col).trim().to_lowercase().as_str(),
                    "1" | "true"
                )
            })
    }

    pub fn header_styles(&self) -> &[HeaderStyle] {
        &self.header_styles
    }

    pub fn set_header_styles(&mut self, styles: Vec<HeaderStyle>) {
        self.header_styles = styles;
    }

    /// Drop all header formatting, as before re-applying a profile
    pub fn clear_header_styles(&mut self) {
        self.header_styles.clear();
    }

    /// All rows as text, for writers
    pub fn rows(&self) -> &[Vec<String>] {
        &self.cells
    }
}
