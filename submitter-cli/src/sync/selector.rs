//! Column selection for partial (PATCH) updates
//!
//! A selection names columns by header or by A1 letters/ranges, e.g.
//! `B:D,status`. Only columns with a valid header are selectable; payloads
//! built from a selection always keep the populated identifying properties so
//! the portal can resolve the target object.

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::Profile;
use crate::sheet::columns::parse_column_letters;
use crate::sheet::{HEADER_ROW, Sheet, is_commented};

use super::mapper::{RowObject, identifying_subset};

static COLUMN_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{1,3})(?::([A-Za-z]{1,3}))?$").expect("valid regex"));

/// A selected column and its header property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumn {
    pub col: usize,
    pub header_prop: String,
}

/// Set of selected 1-based column indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection(BTreeSet<usize>);

impl ColumnSelection {
    pub fn from_columns(cols: impl IntoIterator<Item = usize>) -> Self {
        Self(cols.into_iter().collect())
    }

    /// Parse a comma-separated selection. Header names take precedence over
    /// A1 letters, so a property called `ab` selects its own column.
    pub fn parse(spec: &str, sheet: &Sheet) -> Result<Self> {
        let mut cols = BTreeSet::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(col) = sheet.find_column_by_header(part) {
                cols.insert(col);
                continue;
            }
            let Some(caps) = COLUMN_RANGE.captures(part) else {
                bail!("'{}' is neither a header name nor a column range", part);
            };
            let first = caps.get(1).and_then(|m| parse_column_letters(m.as_str()));
            let last = caps
                .get(2)
                .and_then(|m| parse_column_letters(m.as_str()))
                .or(first);
            match (first, last) {
                (Some(a), Some(b)) => cols.extend(a.min(b)..=a.max(b)),
                _ => bail!("Invalid column range '{}'", part),
            }
        }
        Ok(Self(cols))
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// Selected columns with a valid header, excluding commented ones unless asked
pub fn get_selected_columns(
    sheet: &Sheet,
    selection: &ColumnSelection,
    keep_commented_props: bool,
) -> Vec<SelectedColumn> {
    selection
        .columns()
        .filter_map(|col| {
            let header = sheet.cell(HEADER_ROW, col).trim();
            if header.is_empty() || (is_commented(header) && !keep_commented_props) {
                return None;
            }
            Some(SelectedColumn {
                col,
                header_prop: header.to_string(),
            })
        })
        .collect()
}

/// Restrict a row object to the selected properties plus every populated
/// identifying property. Identifying properties come first.
pub fn restrict_to_selected(
    object: &RowObject,
    selected: &[SelectedColumn],
    profile: &Profile,
) -> RowObject {
    let mut restricted = identifying_subset(object, profile);
    for column in selected {
        // Row objects are keyed by property name, not by the header's spelling
        let key = profile
            .resolve_header(&column.header_prop)
            .map_or(column.header_prop.as_str(), |spec| spec.name.as_str());
        if let Some(value) = object.get(key) {
            restricted.insert(key.to_string(), value.clone());
        }
    }
    restricted
}
