//! Portal profile models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::sheet::columns::{is_commented, normalize_header};

/// Declared type of a profile property, resolved once when the profile is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Text,
    Integer,
    Number,
    Boolean,
    /// Nested object, kept as JSON text in the cell
    Object,
    /// Sequence of items, kept as delimited text in the cell
    Array(Box<PropertyType>),
}

impl PropertyType {
    /// Map a JSON schema `type` keyword (plus `items` for arrays) to a property type
    pub fn from_schema_type(type_name: &str, items: Option<&serde_json::Value>) -> Self {
        match type_name {
            "integer" => PropertyType::Integer,
            "number" => PropertyType::Number,
            "boolean" => PropertyType::Boolean,
            "object" => PropertyType::Object,
            "array" => {
                let item_type = items
                    .and_then(|items| items.get("type"))
                    .and_then(schema_type_name)
                    .map(|name| match name {
                        // Nested arrays are flattened to text items
                        "array" => PropertyType::Text,
                        other => PropertyType::from_schema_type(other, None),
                    })
                    .unwrap_or(PropertyType::Text);
                PropertyType::Array(Box::new(item_type))
            }
            _ => PropertyType::Text,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, PropertyType::Array(_))
    }

    /// Short name used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyType::Text => "string",
            PropertyType::Integer => "integer",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
            PropertyType::Array(_) => "array",
        }
    }
}

/// Read the `type` keyword, which may be a string or a list such as `["string", "null"]`
pub(crate) fn schema_type_name(value: &serde_json::Value) -> Option<&str> {
    match value {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Array(types) => types
            .iter()
            .filter_map(|t| t.as_str())
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// One property of a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub property_type: PropertyType,
    pub required: bool,
    pub identifying: bool,
    /// Only admins may submit it (readonly, notSubmittable, admin permission)
    pub admin_only: bool,
    /// Links to other objects and can be searched for on the portal
    pub searchable: bool,
    /// Allowed values, for the property itself or for its array items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Schema descriptor for one object type
///
/// Immutable once loaded. Property order follows the schema document.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    /// Schema version reported by the portal, if any
    pub version: Option<String>,
    properties: Vec<PropertySpec>,
    identifying_properties: Vec<String>,
    index: HashMap<String, usize>,
    /// Normalized name -> property, for header text typed by hand
    header_index: HashMap<String, usize>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        properties: Vec<PropertySpec>,
        identifying_properties: Vec<String>,
    ) -> Self {
        let index = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        let mut header_index = HashMap::new();
        for (i, p) in properties.iter().enumerate() {
            header_index.entry(normalize_header(&p.name)).or_insert(i);
        }
        Self {
            name: name.into(),
            version,
            properties,
            identifying_properties,
            index,
            header_index,
        }
    }

    /// Look up a property by exact name
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Resolve sheet header text to its property, tolerant to case and
    /// whitespace. Control columns never resolve.
    pub fn resolve_header(&self, header: &str) -> Option<&PropertySpec> {
        if is_commented(header) {
            return None;
        }
        // An exact spelling wins over a normalized match
        if let Some(spec) = self.property(header.trim()) {
            return Some(spec);
        }
        self.header_index
            .get(&normalize_header(header))
            .map(|&i| &self.properties[i])
    }

    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// Identifying property names in lookup priority order
    pub fn identifying_properties(&self) -> &[String] {
        &self.identifying_properties
    }

    pub fn required_properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.iter().filter(|p| p.required)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn spec(name: &str, property_type: PropertyType) -> PropertySpec {
        PropertySpec {
            name: name.to_string(),
            property_type,
            required: false,
            identifying: false,
            admin_only: false,
            searchable: false,
            enum_values: Vec::new(),
            description: None,
        }
    }

    /// accession (identifying), aliases (identifying, array), status (required enum),
    /// lab, read_count, paired, notes, quality (admin only)
    pub fn sample_profile() -> Profile {
        let mut accession = spec("accession", PropertyType::Text);
        accession.identifying = true;
        let mut aliases = spec("aliases", PropertyType::Array(Box::new(PropertyType::Text)));
        aliases.identifying = true;
        let mut status = spec("status", PropertyType::Text);
        status.required = true;
        status.enum_values = vec!["released".into(), "in progress".into(), "deleted".into()];
        let mut lab = spec("lab", PropertyType::Text);
        lab.searchable = true;
        let mut quality = spec("quality", PropertyType::Text);
        quality.admin_only = true;

        Profile::new(
            "sample",
            Some("3".to_string()),
            vec![
                accession,
                aliases,
                status,
                lab,
                spec("read_count", PropertyType::Integer),
                spec("score", PropertyType::Number),
                spec("paired", PropertyType::Boolean),
                spec("documents", PropertyType::Array(Box::new(PropertyType::Text))),
                spec("notes", PropertyType::Text),
                quality,
            ],
            vec!["accession".to_string(), "aliases".to_string()],
        )
    }
}
