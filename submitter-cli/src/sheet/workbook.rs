//! Workbook: ordered sheets loaded from and saved to a file

use std::path::Path;

use anyhow::{Result, bail};

use super::Sheet;
use super::csv_io::{read_workbook_csv, write_workbook_csv};
use super::excel::{read_workbook_xlsx, write_workbook_xlsx};

/// Excel's limit on sheet name length
const MAX_SHEET_NAME_CHARS: usize = 31;

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

/// File formats the submitter can work on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    Xlsx,
    Csv,
}

impl WorkbookFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(WorkbookFormat::Xlsx),
            "csv" => Ok(WorkbookFormat::Csv),
            other => bail!(
                "Unsupported workbook format '{}' for {} (expected .xlsx or .csv)",
                other,
                path.display()
            ),
        }
    }
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// A sheet name not yet used in this workbook: `{base} ({suffix})`, then
    /// `{base} ({suffix} 2)` and so on, with `base` shortened to fit Excel.
    pub fn unused_sheet_name(&self, base: &str, suffix: &str) -> String {
        (1..)
            .map(|n| {
                let tag = if n == 1 {
                    format!(" ({})", suffix)
                } else {
                    format!(" ({} {})", suffix, n)
                };
                let room = MAX_SHEET_NAME_CHARS.saturating_sub(tag.chars().count());
                let stem: String = base.chars().take(room).collect();
                format!("{}{}", stem.trim_end(), tag)
            })
            .find(|name| self.sheet(name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// The named sheet, or the first one when no name is given
    pub fn select_mut(&mut self, name: Option<&str>) -> Result<&mut Sheet> {
        let available: Vec<String> = self.sheets.iter().map(|s| s.name().to_string()).collect();
        let sheet = match name {
            Some(name) => self.sheets.iter_mut().find(|s| s.name() == name),
            None => self.sheets.first_mut(),
        };
        match sheet {
            Some(sheet) => Ok(sheet),
            None => bail!(
                "Sheet '{}' not found (available: {})",
                name.unwrap_or_default(),
                available.join(", ")
            ),
        }
    }
}

/// Load a workbook, dispatching on the file extension
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    match WorkbookFormat::from_path(path)? {
        WorkbookFormat::Xlsx => read_workbook_xlsx(path),
        WorkbookFormat::Csv => read_workbook_csv(path),
    }
}

/// Save a workbook, dispatching on the file extension
pub fn save_workbook(path: &Path, workbook: &Workbook) -> Result<()> {
    match WorkbookFormat::from_path(path)? {
        WorkbookFormat::Xlsx => write_workbook_xlsx(workbook, path),
        WorkbookFormat::Csv => write_workbook_csv(workbook, path),
    }
}
