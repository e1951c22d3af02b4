//! Settings persistence and resolution
//!
//! Workbook settings live in a TOML file next to the workbook; user-wide
//! defaults in the platform config directory.

pub mod settings;

pub use settings::{
    Resolved, ResolvedSettings, SettingKey, SettingsChain, SheetSettings, WorkbookSettings,
    user_config_path,
};
