//! Local schema validation of sheet rows
//!
//! Every eligible row is converted (commented columns dropped) and checked
//! against the profile: required properties must be present and non-empty,
//! present properties must match their declared type and enum. Nothing here
//! touches the network; the verdict is written to the row's response column.

use std::fmt;

use chrono::Local;
use log::{debug, info};
use serde_json::Value;

use crate::api::{Profile, PropertyType};
use crate::sheet::{
    HEADER_COMMENTED_PROP_RESPONSE, HEADER_COMMENTED_PROP_RESPONSE_TIME, Sheet, is_commented,
};

use super::error::SyncError;
use super::mapper::{MapperOptions, RowObject, row_to_object};
use super::values::is_empty_value;

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Reported, does not fail the row
    Warning,
    /// Fails the row
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue on one property
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub property: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            property: property.into(),
            message: message.into(),
        }
    }

    pub fn warning(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.property, self.message)
    }
}

/// Verdict for one row
#[derive(Debug, Clone)]
pub struct RowValidation {
    pub row: usize,
    pub issues: Vec<ValidationIssue>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.issues.iter().all(|i| i.severity != Severity::Error)
    }

    /// Error issues joined as `property: message; ...`, or `None` when valid
    pub fn error_summary(&self) -> Option<String> {
        if self.is_valid() {
            return None;
        }
        let errors: Vec<String> = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| format!("{}: {}", i.property, i.message))
            .collect();
        Some(errors.join("; "))
    }

    /// The row-scoped error for a failed row
    pub fn error(&self) -> Option<SyncError> {
        self.error_summary().map(SyncError::Validation)
    }
}

/// Validation results for a whole sheet
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub rows: Vec<RowValidation>,
    /// Header names not in the profile
    pub missing_properties: Vec<String>,
}

impl ValidationReport {
    /// Number of rows validated
    pub fn validated(&self) -> usize {
        self.rows.len()
    }

    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.validated() - self.valid_count()
    }
}

fn type_matches(value: &Value, property_type: &PropertyType) -> bool {
    match property_type {
        PropertyType::Text => value.is_string(),
        PropertyType::Integer => value.is_i64() || value.is_u64(),
        PropertyType::Number => value.is_number(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Object => value.is_object(),
        PropertyType::Array(item_type) => value
            .as_array()
            .is_some_and(|items| items.iter().all(|item| type_matches(item, item_type))),
    }
}

fn enum_violations<'a>(value: &'a Value, allowed: &[String]) -> Vec<&'a str> {
    let in_enum = |s: &str| allowed.iter().any(|a| a == s);
    match value {
        Value::String(s) if !in_enum(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !in_enum(s))
            .collect(),
        _ => Vec::new(),
    }
}

/// Check one row object against the profile
pub fn validate_object(object: &RowObject, profile: &Profile) -> Vec<ValidationIssue> {
    let mut issues = check_required(object, profile);
    issues.extend(check_properties(object, profile));
    issues
}

/// Every required property must be present and non-empty
pub fn check_required(object: &RowObject, profile: &Profile) -> Vec<ValidationIssue> {
    profile
        .required_properties()
        .filter(|spec| object.get(&spec.name).is_none_or(is_empty_value))
        .map(|spec| ValidationIssue::error(&spec.name, "required property is missing"))
        .collect()
}

/// Type and enum checks on the properties present in the object.
/// Used alone for partial updates, where absent required properties are fine.
pub fn check_properties(object: &RowObject, profile: &Profile) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (name, value) in object {
        let Some(spec) = profile.property(name) else {
            issues.push(ValidationIssue::warning(name, "not defined in profile"));
            continue;
        };
        if !type_matches(value, &spec.property_type) {
            issues.push(ValidationIssue::error(
                name,
                format!("{} is not of type {}", value, spec.property_type.type_name()),
            ));
            continue;
        }
        if !spec.enum_values.is_empty() {
            for bad in enum_violations(value, &spec.enum_values) {
                issues.push(ValidationIssue::error(
                    name,
                    format!("'{}' is not one of [{}]", bad, spec.enum_values.join(", ")),
                ));
            }
        }
    }

    issues
}

/// Validate every eligible row and record the verdict in the response columns.
/// Data columns are never modified.
pub fn validate_sheet(
    sheet: &mut Sheet,
    profile: &Profile,
    options: MapperOptions,
) -> Result<ValidationReport, SyncError> {
    let rows: Vec<usize> = sheet
        .data_rows(options.ignore_hidden_rows)
        .into_iter()
        .filter(|&row| !sheet.is_row_skipped(row))
        .collect();
    if rows.is_empty() {
        return Err(SyncError::NoDataRows(sheet.name().to_string()));
    }

    let missing_properties: Vec<String> = sheet
        .header_names()
        .into_iter()
        .filter(|h| !is_commented(h) && profile.resolve_header(h).is_none())
        .map(str::to_string)
        .collect();

    let response_col = sheet.ensure_control_column(HEADER_COMMENTED_PROP_RESPONSE);
    let time_col = sheet.ensure_control_column(HEADER_COMMENTED_PROP_RESPONSE_TIME);

    let mut report = ValidationReport {
        rows: Vec::with_capacity(rows.len()),
        missing_properties,
    };

    for row in rows {
        let object = row_to_object(sheet, row, profile, false);
        let verdict = RowValidation {
            row,
            issues: validate_object(&object, profile),
        };

        let message = match verdict.error_summary() {
            None => "VALIDATION PASSED".to_string(),
            Some(summary) => format!("VALIDATION FAILED: {}", summary),
        };
        debug!("Row {}: {}", row, message);
        sheet.set_cell(row, response_col, message);
        sheet.set_cell(row, time_col, Local::now().to_rfc3339());

        report.rows.push(verdict);
    }

    info!(
        "Validated {} row(s) on '{}': {} valid, {} invalid",
        report.validated(),
        sheet.name(),
        report.valid_count(),
        report.invalid_count()
    );
    Ok(report)
}
