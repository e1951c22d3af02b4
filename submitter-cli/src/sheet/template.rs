//! Header templates and profile application
//!
//! Applying a profile classifies every header cell against it (the colour
//! legend of the header row) and reports header names the profile does not
//! know. Writers render the classification; nothing here touches data cells.

use log::{debug, warn};

use crate::api::Profile;

use super::columns::{HEADER_COMMENTED_PROP_SKIP, is_commented};
use super::grid::Sheet;

/// Role of a header cell, rendered as its font colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyRole {
    /// red
    Required,
    /// blue
    Identifying,
    /// gray
    AdminOnly,
    /// black
    Editable,
    /// Control column such as `#skip`
    Commented,
    /// Not in the profile
    Missing,
}

impl PropertyRole {
    pub fn legend(&self) -> &'static str {
        match self {
            PropertyRole::Required => "red: required property",
            PropertyRole::Identifying => "blue: identifying property",
            PropertyRole::AdminOnly => "gray: ADMIN only property (readonly, notSubmittable, 'Do not submit')",
            PropertyRole::Editable => "black: other editable property",
            PropertyRole::Commented => "italic gray: commented property, never sent to the portal",
            PropertyRole::Missing => "strikethrough: property missing in the current profile",
        }
    }
}

/// Formatting for one header column
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderStyle {
    pub col: usize,
    pub role: PropertyRole,
    /// Bold + italic
    pub array: bool,
    /// Underlined
    pub searchable: bool,
    /// Tooltip note with the property description
    pub note: Option<String>,
    /// Dropdown values for the data cells below
    pub enum_values: Vec<String>,
}

/// Result of applying a profile to a sheet header
#[derive(Debug, Clone, Default)]
pub struct ProfileApplication {
    /// Header names not found in the profile
    pub missing_properties: Vec<String>,
}

/// Classify a header against the profile
fn role_for(profile: &Profile, header: &str) -> PropertyRole {
    if is_commented(header) {
        return PropertyRole::Commented;
    }
    match profile.resolve_header(header) {
        None => PropertyRole::Missing,
        // Admin-only wins: such columns are never submittable even if required
        Some(p) if p.admin_only => PropertyRole::AdminOnly,
        Some(p) if p.required => PropertyRole::Required,
        Some(p) if p.identifying => PropertyRole::Identifying,
        Some(_) => PropertyRole::Editable,
    }
}

/// Clear previous header formatting, then re-highlight the header per profile.
/// Returns the header names missing from the profile.
pub fn apply_profile(sheet: &mut Sheet, profile: &Profile) -> ProfileApplication {
    sheet.clear_header_styles();

    let mut styles = Vec::new();
    let mut missing_properties = Vec::new();

    for (col, header) in sheet.header() {
        if header.is_empty() {
            continue;
        }
        let role = role_for(profile, header);
        let spec = profile.resolve_header(header);
        if role == PropertyRole::Missing {
            missing_properties.push(header.to_string());
        }
        styles.push(HeaderStyle {
            col,
            role,
            array: spec.is_some_and(|p| p.property_type.is_array()),
            searchable: spec.is_some_and(|p| p.searchable),
            note: spec.and_then(|p| p.description.clone()),
            enum_values: spec.map(|p| p.enum_values.clone()).unwrap_or_default(),
        });
    }

    if !missing_properties.is_empty() {
        warn!(
            "Sheet '{}' has properties missing in profile '{}': {}",
            sheet.name(),
            profile.name,
            missing_properties.join(", ")
        );
    }

    sheet.set_header_styles(styles);
    ProfileApplication { missing_properties }
}

/// Header names for a fresh template: the skip flag, identifying properties,
/// required properties, then the rest in profile order.
pub fn template_header(profile: &Profile, for_admin: bool) -> Vec<String> {
    let mut header = vec![HEADER_COMMENTED_PROP_SKIP.to_string()];
    let mut push = |name: &str| {
        if !header.iter().any(|h| h == name) {
            header.push(name.to_string());
        }
    };

    let visible = |name: &str| {
        profile
            .property(name)
            .is_some_and(|p| for_admin || !p.admin_only)
    };

    for name in profile.identifying_properties() {
        if visible(name) {
            push(name);
        }
    }
    for spec in profile.required_properties() {
        if visible(&spec.name) {
            push(&spec.name);
        }
    }
    for spec in profile.properties() {
        if visible(&spec.name) {
            push(&spec.name);
        }
    }
    header
}

/// Add the profile's template header to the sheet. Existing header columns are
/// kept; only missing names are appended. Returns the number of columns added.
pub fn make_template(sheet: &mut Sheet, profile: &Profile, for_admin: bool) -> usize {
    let mut added = 0;
    for name in template_header(profile, for_admin) {
        let exists = if is_commented(&name) {
            sheet.find_control_column(&name).is_some()
        } else {
            sheet.find_column_by_header(&name).is_some()
        };
        if exists {
            continue;
        }
        sheet.append_header(&name);
        added += 1;
    }
    debug!(
        "Template for '{}' added {} column(s) to sheet '{}'",
        profile.name,
        added,
        sheet.name()
    );
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::profile::models::fixtures::sample_profile;
    use crate::sheet::grid::HEADER_ROW;

    #[test]
    fn test_template_header_order() {
        let profile = sample_profile();
        let header = template_header(&profile, false);
        assert_eq!(
            header[..5],
            ["#skip", "accession", "aliases", "status", "lab"]
        );
        assert!(!header.contains(&"quality".to_string()));

        let admin_header = template_header(&profile, true);
        assert!(admin_header.contains(&"quality".to_string()));
    }

    #[test]
    fn test_make_template_keeps_existing_columns() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows("s", vec![vec!["status", "accession"], vec!["released", "X1"]]);

        let added = make_template(&mut sheet, &profile, false);

        assert_eq!(sheet.cell(HEADER_ROW, 1), "status");
        assert_eq!(sheet.cell(HEADER_ROW, 2), "accession");
        assert_eq!(sheet.cell(HEADER_ROW, 3), "#skip");
        assert_eq!(sheet.cell(2, 1), "released");
        assert_eq!(added, template_header(&profile, false).len() - 2);
        // Running it again adds nothing
        assert_eq!(make_template(&mut sheet, &profile, false), 0);
    }

    #[test]
    fn test_apply_profile_reports_missing() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![vec!["accession", "status", "colour", "#skip", "aliases", "quality"]],
        );

        let applied = apply_profile(&mut sheet, &profile);

        assert_eq!(applied.missing_properties, vec!["colour"]);
        let roles: Vec<PropertyRole> = sheet.header_styles().iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                PropertyRole::Identifying,
                PropertyRole::Required,
                PropertyRole::Missing,
                PropertyRole::Commented,
                PropertyRole::Identifying,
                PropertyRole::AdminOnly,
            ]
        );
        let aliases = &sheet.header_styles()[4];
        assert!(aliases.array);
        let status = &sheet.header_styles()[1];
        assert_eq!(status.enum_values.len(), 3);
    }

    #[test]
    fn test_apply_profile_matches_headers_loosely() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows("s", vec![vec!["Accession", " STATUS ", "Lab"]]);

        let applied = apply_profile(&mut sheet, &profile);

        assert!(applied.missing_properties.is_empty());
        let roles: Vec<PropertyRole> = sheet.header_styles().iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![PropertyRole::Identifying, PropertyRole::Required, PropertyRole::Editable]
        );
        assert!(sheet.header_styles()[2].searchable);
    }
}
