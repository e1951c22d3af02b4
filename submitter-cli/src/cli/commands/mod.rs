//! Command handlers

pub mod export;
pub mod session;
pub mod settings;
pub mod sync;
pub mod template;
pub mod update;
pub mod validate;

use anyhow::Result;

use super::{Cli, Commands};
use crate::sync::SubmitMethod;

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let global = cli.global;

    if global.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Template { admin } => template::handle_template(&global, admin).await,
        Commands::ApplyProfile => template::handle_apply_profile(&global).await,
        Commands::Get { admin, rows } => sync::handle_get(&global, admin, rows).await,
        Commands::UpdateSheet { all, admin, rows } => {
            update::handle_update_sheet(&global, all, admin, rows).await
        }
        Commands::Put { validate, rows } => {
            sync::handle_submit(&global, SubmitMethod::Put, None, validate, rows).await
        }
        Commands::Post { validate, rows } => {
            sync::handle_submit(&global, SubmitMethod::Post, None, validate, rows).await
        }
        Commands::Patch {
            columns,
            validate,
            rows,
        } => sync::handle_submit(&global, SubmitMethod::Patch, columns, validate, rows).await,
        Commands::Validate { rows } => validate::handle_validate(&global, rows).await,
        Commands::RowJson { row } => export::handle_row_json(&global, row).await,
        Commands::Export { output, rows } => export::handle_export(&global, output, rows).await,
        Commands::Settings(command) => settings::handle_settings(&global, command),
    }
}
