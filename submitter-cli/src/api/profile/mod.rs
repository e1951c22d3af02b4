//! Profile (object schema) loading
//!
//! The portal serves one JSON schema per object type. It is parsed once per
//! sync pass into a [`Profile`] so both directions of the row mapper and the
//! validator see the same resolved property types.

pub mod models;

pub use models::{Profile, PropertySpec, PropertyType};

use anyhow::{Context, Result};
use serde_json::Value;

use models::schema_type_name;

/// Comment marker the portal puts on properties that must not be submitted
const DO_NOT_SUBMIT: &str = "do not submit";

/// Parse a portal JSON schema into a profile
pub fn parse_profile(name: &str, schema: &Value) -> Result<Profile> {
    let props = schema
        .get("properties")
        .and_then(Value::as_object)
        .with_context(|| format!("Profile '{}' has no 'properties' object", name))?;

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let identifying_properties: Vec<String> = schema
        .get("identifyingProperties")
        .and_then(Value::as_array)
        .map(|r| {
            r.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let properties = props
        .iter()
        .map(|(prop_name, prop)| PropertySpec {
            name: prop_name.clone(),
            property_type: property_type(prop),
            required: required.contains(&prop_name.as_str()),
            identifying: identifying_properties.iter().any(|p| p == prop_name),
            admin_only: is_admin_only(prop),
            searchable: is_searchable(prop),
            enum_values: enum_values(prop),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect();

    let version = schema.get("version").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Ok(Profile::new(name, version, properties, identifying_properties))
}

fn property_type(prop: &Value) -> PropertyType {
    prop.get("type")
        .and_then(schema_type_name)
        .map(|t| PropertyType::from_schema_type(t, prop.get("items")))
        .unwrap_or(PropertyType::Text)
}

fn is_admin_only(prop: &Value) -> bool {
    let flag = |key: &str| prop.get(key).and_then(Value::as_bool).unwrap_or(false);
    let admin_permission = prop
        .get("permission")
        .and_then(Value::as_str)
        .is_some_and(|p| p.contains("admin") || p == "import_items");
    let do_not_submit = prop
        .get("comment")
        .and_then(Value::as_str)
        .is_some_and(|c| c.to_lowercase().contains(DO_NOT_SUBMIT));

    flag("readonly") || flag("notSubmittable") || admin_permission || do_not_submit
}

fn is_searchable(prop: &Value) -> bool {
    prop.get("linkTo").is_some()
        || prop
            .get("items")
            .is_some_and(|items| items.get("linkTo").is_some())
}

fn enum_values(prop: &Value) -> Vec<String> {
    let list = prop
        .get("enum")
        .or_else(|| prop.get("items").and_then(|items| items.get("enum")));

    list.and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lab_schema() -> Value {
        json!({
            "title": "Measurement set",
            "version": "12",
            "required": ["lab", "assay_term"],
            "identifyingProperties": ["uuid", "accession", "aliases"],
            "properties": {
                "uuid": {"type": "string", "permission": "admin_only"},
                "accession": {"type": "string", "readonly": true},
                "aliases": {"type": "array", "items": {"type": "string"}},
                "lab": {"type": "string", "linkTo": "Lab", "description": "Lab that produced it."},
                "assay_term": {"type": "string"},
                "status": {"type": "string", "enum": ["released", "in progress"]},
                "files": {"type": "array", "items": {"type": "string", "linkTo": "File"}},
                "replicates": {"type": ["null", "integer"]},
                "schema_version": {"type": "string", "comment": "Do not submit. Value is assigned by the server."}
            }
        })
    }

    #[test]
    fn test_parse_profile_flags() {
        let profile = parse_profile("measurement_set", &lab_schema()).unwrap();

        assert_eq!(profile.version.as_deref(), Some("12"));
        assert_eq!(profile.identifying_properties(), ["uuid", "accession", "aliases"]);

        let lab = profile.property("lab").unwrap();
        assert!(lab.required);
        assert!(lab.searchable);
        assert_eq!(lab.description.as_deref(), Some("Lab that produced it."));

        assert!(profile.property("uuid").unwrap().admin_only);
        assert!(profile.property("accession").unwrap().admin_only);
        assert!(profile.property("schema_version").unwrap().admin_only);
        assert!(!profile.property("assay_term").unwrap().admin_only);

        let aliases = profile.property("aliases").unwrap();
        assert!(aliases.identifying);
        assert!(aliases.property_type.is_array());

        assert!(profile.property("files").unwrap().searchable);
        assert_eq!(
            profile.property("replicates").unwrap().property_type,
            PropertyType::Integer
        );
        assert_eq!(
            profile.property("status").unwrap().enum_values,
            vec!["released", "in progress"]
        );
    }

    #[test]
    fn test_parse_profile_keeps_schema_order() {
        let profile = parse_profile("measurement_set", &lab_schema()).unwrap();
        let names: Vec<&str> = profile.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[..3], ["uuid", "accession", "aliases"]);
    }

    #[test]
    fn test_parse_profile_without_properties() {
        assert!(parse_profile("broken", &json!({"title": "x"})).is_err());
    }
}
