//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::SettingKey;

#[derive(Parser)]
#[command(name = "metadata-submitter")]
#[command(about = "Keep spreadsheet metadata in sync with a REST metadata portal")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Workbook to operate on (.xlsx or .csv)
    pub workbook: PathBuf,

    /// Sheet name (defaults to the first sheet)
    #[arg(long, short, global = true)]
    pub sheet: Option<String>,

    /// Endpoint for GET and profile lookups
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint_read: Option<String>,

    /// Endpoint for PUT, POST and PATCH
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint_write: Option<String>,

    /// Profile (object type) name, e.g. measurement_set
    #[arg(long, short, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(long, short, global = true)]
    pub yes: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More logging (-v info, -vv debug)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Row selection shared by the sync commands
#[derive(Args, Debug, Clone, Copy)]
pub struct RowArgs {
    /// Include hidden rows
    #[arg(long)]
    pub include_hidden: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a header row for the profile (appends missing columns only)
    Template {
        /// Include admin-only properties
        #[arg(long)]
        admin: bool,
    },
    /// Restyle the header for the profile and report unknown columns
    ApplyProfile,
    /// Fill rows with the portal's current objects
    Get {
        /// Also write admin-only properties
        #[arg(long)]
        admin: bool,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Rebuild the sheet under its current profile into a new sheet, filled from the portal
    UpdateSheet {
        /// Rebuild every sheet that has a profile configured
        #[arg(long)]
        all: bool,
        /// Include admin-only properties
        #[arg(long)]
        admin: bool,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Replace existing objects (properties missing from a row are removed remotely)
    Put {
        /// Validate rows locally first and skip the call for invalid ones
        #[arg(long)]
        validate: bool,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Create new objects and write assigned identifiers back
    Post {
        #[arg(long)]
        validate: bool,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Partially update existing objects
    Patch {
        /// Restrict to these columns: header names and/or letters, e.g. "B:D,status"
        #[arg(long, value_name = "SPEC")]
        columns: Option<String>,
        #[arg(long)]
        validate: bool,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Validate rows against the profile without contacting the portal
    Validate {
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Print one row as JSON
    RowJson {
        /// Sheet row number (the header is row 1)
        #[arg(long)]
        row: usize,
    },
    /// Export all eligible rows as a JSON array
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        rows: RowArgs,
    },
    /// Show or edit settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show effective settings, where they come from, and the header legend
    Show,
    /// Set a value for the current sheet, or the workbook default with --default
    Set {
        #[arg(value_enum)]
        key: SettingKey,
        /// New value; omit to clear
        value: Option<String>,
        /// Set the workbook-wide default instead of the sheet value
        #[arg(long)]
        default: bool,
    },
}
