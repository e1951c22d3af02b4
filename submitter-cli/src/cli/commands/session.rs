//! Workbook, settings and portal wiring shared by the command handlers

use std::io::stdin;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::*;
use is_terminal::IsTerminal;
use log::{info, warn};

use crate::api::{Credentials, PortalClient, Profile, ProfileSource};
use crate::cli::GlobalArgs;
use crate::config::{ResolvedSettings, SettingsChain, SheetSettings, WorkbookSettings, user_config_path};
use crate::sheet::{Sheet, Workbook, apply_profile, load_workbook, save_workbook};

/// An opened workbook with its resolved settings for one sheet
pub struct Session {
    pub workbook_path: PathBuf,
    pub settings_path: PathBuf,
    pub workbook: Workbook,
    pub settings: WorkbookSettings,
    pub user: SheetSettings,
    flags: SheetSettings,
    pub sheet_name: String,
    pub resolved: ResolvedSettings,
}

impl Session {
    /// Open the workbook. With `create_if_missing` a missing file starts as
    /// an empty workbook holding one sheet.
    pub fn open(args: &GlobalArgs, create_if_missing: bool) -> Result<Self> {
        let workbook_path = args.workbook.clone();
        let workbook = if workbook_path.exists() {
            load_workbook(&workbook_path)?
        } else if create_if_missing {
            let name = args.sheet.clone().unwrap_or_else(|| "Sheet1".to_string());
            info!("Creating new workbook {}", workbook_path.display());
            Workbook::new(vec![Sheet::new(name)])
        } else {
            bail!("Workbook does not exist: {}", workbook_path.display());
        };

        let sheet_name = match &args.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheets()
                .first()
                .map(|s| s.name().to_string())
                .context("Workbook has no sheets")?,
        };
        if workbook.sheet(&sheet_name).is_none() {
            bail!("Sheet '{}' not found in {}", sheet_name, workbook_path.display());
        }

        let settings_path = WorkbookSettings::sidecar_path(&workbook_path);
        let settings = WorkbookSettings::load(&settings_path)?;
        let user = match user_config_path() {
            Some(path) => SheetSettings::load(&path)?,
            None => SheetSettings::default(),
        };
        let flags = SheetSettings {
            endpoint_read: args.endpoint_read.clone(),
            endpoint_write: args.endpoint_write.clone(),
            profile_name: args.profile.clone(),
            last_used_schema_version: None,
        };

        let resolved = SettingsChain {
            flags: &flags,
            workbook: &settings,
            user: &user,
        }
        .resolve(&sheet_name);

        Ok(Self {
            workbook_path,
            settings_path,
            workbook,
            settings,
            user,
            flags,
            sheet_name,
            resolved,
        })
    }

    /// Re-resolve after the settings layers changed
    pub fn refresh(&mut self) {
        self.resolved = self.resolve_for(&self.sheet_name);
    }

    /// Effective settings for any sheet of the workbook
    pub fn resolve_for(&self, sheet_name: &str) -> ResolvedSettings {
        SettingsChain {
            flags: &self.flags,
            workbook: &self.settings,
            user: &self.user,
        }
        .resolve(sheet_name)
    }

    pub fn sheet(&self) -> Result<&Sheet> {
        self.workbook
            .sheet(&self.sheet_name)
            .with_context(|| format!("Sheet '{}' not found", self.sheet_name))
    }

    pub fn sheet_mut(&mut self) -> Result<&mut Sheet> {
        self.workbook.select_mut(Some(&self.sheet_name))
    }

    pub fn client(endpoint: &str) -> Result<PortalClient> {
        let credentials = Credentials::from_env();
        if credentials.is_none() {
            warn!("No portal credentials in the environment; requests are anonymous");
        }
        PortalClient::new(endpoint, credentials)
    }

    pub fn read_client(&self) -> Result<PortalClient> {
        Self::client(&self.resolved.endpoint_read.value)
    }

    pub fn write_client(&self) -> Result<PortalClient> {
        Self::client(&self.resolved.endpoint_write.value)
    }

    /// Fetch the configured profile from the read endpoint
    pub async fn fetch_profile(&self) -> Result<Profile> {
        Self::fetch_profile_with(&self.resolved).await
    }

    /// Fetch the profile named by `resolved` from its read endpoint
    pub async fn fetch_profile_with(resolved: &ResolvedSettings) -> Result<Profile> {
        let name = resolved.profile_name()?;
        let profile = Self::client(&resolved.endpoint_read.value)?
            .fetch_profile(name)
            .await?;
        if let (Some(last), Some(current)) = (&resolved.last_used_schema_version, &profile.version)
        {
            if last != current {
                warn!(
                    "Profile '{}' schema version changed from {} to {}",
                    profile.name, last, current
                );
            }
        }
        Ok(profile)
    }

    /// Restyle the sheet header for the profile, reporting unknown columns
    pub fn apply_profile(&mut self, profile: &Profile) -> Result<Vec<String>> {
        let application = apply_profile(self.sheet_mut()?, profile);
        if !application.missing_properties.is_empty() {
            println!(
                "{} {}",
                "Columns not in profile:".yellow(),
                application.missing_properties.join(", ")
            );
        }
        Ok(application.missing_properties)
    }

    /// Pin the resolved settings and schema version to this sheet
    pub fn pin_settings(&mut self, profile: &Profile) {
        self.settings
            .save_sheet_settings(&self.sheet_name, &self.resolved, profile.version.as_deref());
    }

    /// Write the workbook and its settings file
    pub fn save(&self) -> Result<()> {
        save_workbook(&self.workbook_path, &self.workbook)?;
        if !self.settings.defaults.is_empty() || !self.settings.sheets.is_empty() {
            self.settings.save(&self.settings_path)?;
        }
        info!("Saved {}", self.workbook_path.display());
        Ok(())
    }

    pub fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.settings_path)
    }
}

/// Ask before changing anything remote or on disk
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !stdin().is_terminal() {
        bail!("Refusing to continue without a terminal; pass --yes to confirm");
    }
    let answer = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")?;
    Ok(answer)
}
