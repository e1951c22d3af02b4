//! Layered settings: flag -> sheet -> workbook -> user -> built-in default

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::constants::{DEFAULT_ENDPOINT_READ, DEFAULT_ENDPOINT_WRITE};
use crate::sync::SyncError;

/// Suffix of the settings file kept next to a workbook
pub const SIDECAR_SUFFIX: &str = "submitter.toml";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "metadata-submitter";

/// One layer's worth of settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_read: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_write: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Schema version of the profile last used on this sheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_schema_version: Option<String>,
}

/// Settings keys editable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SettingKey {
    EndpointRead,
    EndpointWrite,
    ProfileName,
}

impl SheetSettings {
    /// Set (or clear, with `None`) one key
    pub fn set(&mut self, key: SettingKey, value: Option<String>) {
        let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        match key {
            SettingKey::EndpointRead => self.endpoint_read = value,
            SettingKey::EndpointWrite => self.endpoint_write = value,
            SettingKey::ProfileName => self.profile_name = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Load a standalone settings file; a missing file is an empty layer
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }
}

/// Settings for a whole workbook: defaults plus per-sheet overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSettings {
    #[serde(default)]
    pub defaults: SheetSettings,
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetSettings>,
}

impl WorkbookSettings {
    /// `<dir>/<stem>.submitter.toml` for `<dir>/<stem>.<ext>`
    pub fn sidecar_path(workbook: &Path) -> PathBuf {
        let stem = workbook
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workbook".to_string());
        workbook.with_file_name(format!("{}.{}", stem, SIDECAR_SUFFIX))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No workbook settings at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        debug!("Saved workbook settings to {}", path.display());
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSettings> {
        self.sheets.get(name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> &mut SheetSettings {
        self.sheets.entry(name.to_string()).or_default()
    }

    /// Pin the resolved values to a sheet so later runs reuse them even when
    /// the defaults change.
    pub fn save_sheet_settings(
        &mut self,
        sheet_name: &str,
        resolved: &ResolvedSettings,
        schema_version: Option<&str>,
    ) {
        let sheet = self.sheet_mut(sheet_name);
        sheet.endpoint_read = Some(resolved.endpoint_read.value.clone());
        sheet.endpoint_write = Some(resolved.endpoint_write.value.clone());
        if let Some(profile) = &resolved.profile_name {
            sheet.profile_name = Some(profile.value.clone());
        }
        if let Some(version) = schema_version {
            sheet.last_used_schema_version = Some(version.to_string());
        }
    }
}

/// `<config dir>/metadata-submitter/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Which layer a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Flag,
    Sheet,
    Workbook,
    User,
    Default,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Flag => "command line",
            Layer::Sheet => "sheet",
            Layer::Workbook => "workbook default",
            Layer::User => "user config",
            Layer::Default => "built-in default",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: String,
    pub layer: Layer,
}

/// Effective settings for one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub endpoint_read: Resolved,
    pub endpoint_write: Resolved,
    pub profile_name: Option<Resolved>,
    pub last_used_schema_version: Option<String>,
}

impl ResolvedSettings {
    /// The profile to sync with; there is no built-in default
    pub fn profile_name(&self) -> Result<&str, SyncError> {
        self.profile_name
            .as_ref()
            .map(|r| r.value.as_str())
            .ok_or_else(|| {
                SyncError::Configuration(
                    "no profile name set (use --profile or `settings set profile-name`)".to_string(),
                )
            })
    }
}

/// The layers, highest precedence first
#[derive(Debug, Clone, Copy)]
pub struct SettingsChain<'a> {
    pub flags: &'a SheetSettings,
    pub workbook: &'a WorkbookSettings,
    pub user: &'a SheetSettings,
}

impl SettingsChain<'_> {
    fn pick(
        &self,
        sheet_name: &str,
        field: impl Fn(&SheetSettings) -> Option<&String>,
    ) -> Option<Resolved> {
        let layers = [
            (Layer::Flag, Some(self.flags)),
            (Layer::Sheet, self.workbook.sheet(sheet_name)),
            (Layer::Workbook, Some(&self.workbook.defaults)),
            (Layer::User, Some(self.user)),
        ];
        layers.into_iter().find_map(|(layer, settings)| {
            let value = settings.and_then(&field)?;
            Some(Resolved {
                value: value.clone(),
                layer,
            })
        })
    }

    pub fn resolve(&self, sheet_name: &str) -> ResolvedSettings {
        let or_default = |resolved: Option<Resolved>, default: &str| {
            resolved.unwrap_or_else(|| Resolved {
                value: default.to_string(),
                layer: Layer::Default,
            })
        };

        ResolvedSettings {
            endpoint_read: or_default(
                self.pick(sheet_name, |s| s.endpoint_read.as_ref()),
                DEFAULT_ENDPOINT_READ,
            ),
            endpoint_write: or_default(
                self.pick(sheet_name, |s| s.endpoint_write.as_ref()),
                DEFAULT_ENDPOINT_WRITE,
            ),
            profile_name: self.pick(sheet_name, |s| s.profile_name.as_ref()),
            last_used_schema_version: self
                .workbook
                .sheet(sheet_name)
                .and_then(|s| s.last_used_schema_version.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(read: Option<&str>, profile: Option<&str>) -> SheetSettings {
        SheetSettings {
            endpoint_read: read.map(str::to_string),
            profile_name: profile.map(str::to_string),
            ..SheetSettings::default()
        }
    }

    #[test]
    fn test_resolution_order() {
        let mut workbook = WorkbookSettings {
            defaults: layer(Some("https://workbook"), Some("measurement_set")),
            ..WorkbookSettings::default()
        };
        workbook
            .sheets
            .insert("Samples".into(), layer(None, Some("sample")));
        let user = layer(Some("https://user"), None);
        let flags = SheetSettings::default();

        let chain = SettingsChain {
            flags: &flags,
            workbook: &workbook,
            user: &user,
        };

        let samples = chain.resolve("Samples");
        assert_eq!(samples.profile_name().unwrap(), "sample");
        assert_eq!(samples.profile_name.unwrap().layer, Layer::Sheet);
        assert_eq!(samples.endpoint_read.value, "https://workbook");
        assert_eq!(samples.endpoint_write.value, DEFAULT_ENDPOINT_WRITE);
        assert_eq!(samples.endpoint_write.layer, Layer::Default);

        let other = chain.resolve("Other");
        assert_eq!(other.profile_name().unwrap(), "measurement_set");

        let flags = layer(Some("https://flag"), Some("donor"));
        let chain = SettingsChain {
            flags: &flags,
            ..chain
        };
        let flagged = chain.resolve("Samples");
        assert_eq!(flagged.endpoint_read.layer, Layer::Flag);
        assert_eq!(flagged.profile_name().unwrap(), "donor");
    }

    #[test]
    fn test_user_layer_below_workbook() {
        let workbook = WorkbookSettings::default();
        let user = layer(Some("https://user"), Some("sample"));
        let flags = SheetSettings::default();
        let resolved = SettingsChain {
            flags: &flags,
            workbook: &workbook,
            user: &user,
        }
        .resolve("Sheet1");

        assert_eq!(resolved.endpoint_read.value, "https://user");
        assert_eq!(resolved.endpoint_read.layer, Layer::User);
    }

    #[test]
    fn test_missing_profile_is_configuration_error() {
        let workbook = WorkbookSettings::default();
        let empty = SheetSettings::default();
        let resolved = SettingsChain {
            flags: &empty,
            workbook: &workbook,
            user: &empty,
        }
        .resolve("Sheet1");

        assert!(matches!(
            resolved.profile_name(),
            Err(SyncError::Configuration(_))
        ));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            WorkbookSettings::sidecar_path(Path::new("/data/samples.xlsx")),
            PathBuf::from("/data/samples.submitter.toml")
        );
    }

    #[test]
    fn test_save_sheet_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.submitter.toml");

        let mut workbook = WorkbookSettings::load(&path).unwrap();
        assert_eq!(workbook, WorkbookSettings::default());

        workbook.defaults.set(SettingKey::ProfileName, Some("sample".into()));
        let empty = SheetSettings::default();
        let resolved = SettingsChain {
            flags: &empty,
            workbook: &workbook,
            user: &empty,
        }
        .resolve("Samples");
        workbook.save_sheet_settings("Samples", &resolved, Some("3"));
        workbook.save(&path).unwrap();

        let loaded = WorkbookSettings::load(&path).unwrap();
        let sheet = loaded.sheet("Samples").unwrap();
        assert_eq!(sheet.profile_name.as_deref(), Some("sample"));
        assert_eq!(sheet.endpoint_read.as_deref(), Some(DEFAULT_ENDPOINT_READ));
        assert_eq!(sheet.last_used_schema_version.as_deref(), Some("3"));
        assert_eq!(loaded, workbook);
    }

    #[test]
    fn test_set_clears_blank_values() {
        let mut settings = layer(Some("https://x"), None);
        settings.set(SettingKey::EndpointRead, Some("  ".into()));
        assert!(settings.is_empty());
    }
}
