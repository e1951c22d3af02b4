//! Row <-> object mapping
//!
//! A row object is built from the header left to right: commented columns are
//! dropped (unless asked to keep them), empty cells are dropped, headers the
//! profile does not know are dropped, and the rest is keyed by property name
//! and coerced per declared type. Writing back only touches cells for
//! properties present in the object.

use log::debug;
use serde_json::{Map, Value};

use crate::api::Profile;
use crate::sheet::{Sheet, is_commented};

use super::values::{format_cell, is_empty_value, parse_cell};

/// Indent width of exported JSON
pub const EXPORTED_JSON_INDENT: usize = 2;

/// A JSON object materialized from one data row
pub type RowObject = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperOptions {
    /// Keep `#`-prefixed control columns in the object (as plain text)
    pub keep_commented_props: bool,
    /// Leave hidden rows out of bulk conversions
    pub ignore_hidden_rows: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            keep_commented_props: false,
            ignore_hidden_rows: true,
        }
    }
}

/// Convert one sheet row into a row object
pub fn row_to_object(
    sheet: &Sheet,
    row: usize,
    profile: &Profile,
    keep_commented_props: bool,
) -> RowObject {
    let mut object = Map::new();

    for (col, header) in sheet.header() {
        if header.is_empty() {
            continue;
        }
        let commented = is_commented(header);
        if commented && !keep_commented_props {
            continue;
        }

        let text = sheet.cell(row, col);
        if text.trim().is_empty() {
            continue;
        }

        if commented {
            object.insert(header.to_string(), Value::String(text.to_string()));
            continue;
        }

        // Unknown headers are reported when the profile is applied, not here
        let Some(spec) = profile.resolve_header(header) else {
            continue;
        };

        object.insert(spec.name.clone(), parse_cell(text, &spec.property_type));
    }

    object
}

/// Write an object's properties into a row.
///
/// Only columns present in the header and in the object are written; every
/// other cell is left alone. Admin-only properties are written only when
/// `for_admin` is set. Returns the number of cells written.
pub fn object_to_row(
    sheet: &mut Sheet,
    row: usize,
    object: &RowObject,
    profile: &Profile,
    for_admin: bool,
) -> usize {
    let targets: Vec<(usize, String)> = sheet
        .header()
        .into_iter()
        .filter(|(_, header)| !header.is_empty() && !is_commented(header))
        .filter_map(|(col, header)| {
            let spec = profile.resolve_header(header)?;
            if spec.admin_only && !for_admin {
                return None;
            }
            let value = object.get(&spec.name)?;
            Some((col, format_cell(value, &spec.property_type)))
        })
        .collect();

    let written = targets.len();
    for (col, text) in targets {
        sheet.set_cell(row, col, text);
    }
    written
}

/// The row's identifying key: the first populated identifying property in
/// profile order, as (property, value used to address the remote object).
pub fn identifying_key(object: &RowObject, profile: &Profile) -> Option<(String, String)> {
    profile.identifying_properties().iter().find_map(|prop| {
        let value = object.get(prop)?;
        let id = match value {
            Value::String(s) => s.trim().to_string(),
            // Aliases and other array identifiers address by their first item
            Value::Array(items) => items.first().and_then(Value::as_str)?.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!id.is_empty()).then(|| (prop.clone(), id))
    })
}

/// Identifying properties present in the object, restricted to those keys
pub fn identifying_subset(object: &RowObject, profile: &Profile) -> RowObject {
    profile
        .identifying_properties()
        .iter()
        .filter_map(|prop| {
            let value = object.get(prop)?;
            (!is_empty_value(value)).then(|| (prop.clone(), value.clone()))
        })
        .collect()
}

/// Map every eligible (non-skipped, optionally non-hidden) data row
pub fn export_sheet_to_objects(
    sheet: &Sheet,
    profile: &Profile,
    options: MapperOptions,
) -> Vec<(usize, RowObject)> {
    let rows: Vec<(usize, RowObject)> = sheet
        .data_rows(options.ignore_hidden_rows)
        .into_iter()
        .filter(|&row| !sheet.is_row_skipped(row))
        .map(|row| {
            (
                row,
                row_to_object(sheet, row, profile, options.keep_commented_props),
            )
        })
        .collect();
    debug!("Exported {} row(s) from sheet '{}'", rows.len(), sheet.name());
    rows
}

/// Export as a JSON array, pretty-printed with the given indent width
pub fn export_sheet_to_json(
    sheet: &Sheet,
    profile: &Profile,
    options: MapperOptions,
    indent: usize,
) -> serde_json::Result<String> {
    let objects: Vec<Value> = export_sheet_to_objects(sheet, profile, options)
        .into_iter()
        .map(|(_, object)| Value::Object(object))
        .collect();
    to_json_pretty(&Value::Array(objects), indent)
}

/// Pretty-print JSON with a fixed indent width
pub fn to_json_pretty(value: &Value, indent: usize) -> serde_json::Result<String> {
    use serde::Serialize;

    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
