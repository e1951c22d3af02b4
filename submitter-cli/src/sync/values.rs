//! Cell text <-> JSON value coercion
//!
//! Both directions are driven by the declared [`PropertyType`], so a cell
//! parsed here and formatted back reproduces the original text for
//! well-formed input.

use serde_json::{Number, Value};

use crate::api::PropertyType;

/// Delimiter for array-typed cells
pub const ARRAY_DELIMITER: char = ',';

/// Parse boolean cell text: "true"/"false"/"1"/"0", case-insensitive
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Coerce cell text to a JSON value for the declared type.
///
/// Text that does not parse as the declared type is kept as a string so the
/// validator can report it.
pub fn parse_cell(text: &str, property_type: &PropertyType) -> Value {
    let trimmed = text.trim();
    match property_type {
        PropertyType::Text => Value::String(text.to_string()),
        PropertyType::Integer => match trimmed.parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => Value::String(text.to_string()),
        },
        PropertyType::Number => match parse_number(trimmed) {
            Some(n) => Value::Number(n),
            None => Value::String(text.to_string()),
        },
        PropertyType::Boolean => match parse_bool(trimmed) {
            Some(b) => Value::Bool(b),
            None => Value::String(text.to_string()),
        },
        PropertyType::Object => {
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        PropertyType::Array(item_type) => {
            // A JSON array literal is taken as-is (arrays of objects)
            if trimmed.starts_with('[') {
                if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed) {
                    return value;
                }
            }
            Value::Array(
                trimmed
                    .split(ARRAY_DELIMITER)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| parse_cell(item, item_type))
                    .collect(),
            )
        }
    }
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Format a JSON value as cell text, the inverse of [`parse_cell`]
pub fn format_cell(value: &Value, property_type: &PropertyType) -> String {
    match (value, property_type) {
        (Value::Array(items), _) => {
            if items.iter().any(|v| v.is_object() || v.is_array()) {
                value.to_string()
            } else {
                items
                    .iter()
                    .map(format_scalar)
                    .collect::<Vec<_>>()
                    .join(&ARRAY_DELIMITER.to_string())
            }
        }
        (Value::Object(_), _) => value.to_string(),
        (other, _) => format_scalar(other),
    }
}

/// Is a value "empty" for required-property purposes?
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
