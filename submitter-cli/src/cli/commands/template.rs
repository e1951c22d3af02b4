//! `template` and `apply-profile`

use anyhow::Result;
use colored::*;

use super::session::{Session, confirm};
use crate::cli::GlobalArgs;
use crate::sheet::make_template;

/// Write the profile's header row, creating the workbook if needed
pub async fn handle_template(args: &GlobalArgs, for_admin: bool) -> Result<()> {
    let mut session = Session::open(args, true)?;
    let profile = session.fetch_profile().await?;

    if !confirm(
        &format!(
            "Write a '{}' header to sheet '{}'?",
            profile.name, session.sheet_name
        ),
        args.yes,
    )? {
        return Ok(());
    }

    let added = make_template(session.sheet_mut()?, &profile, for_admin);
    session.apply_profile(&profile)?;
    session.pin_settings(&profile);
    session.save()?;

    println!(
        "{} {} column(s) to '{}' for profile {}",
        "Added".green(),
        added,
        session.sheet_name,
        profile.name.bold()
    );
    Ok(())
}

/// Restyle the header without touching any data
pub async fn handle_apply_profile(args: &GlobalArgs) -> Result<()> {
    let mut session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;

    let missing = session.apply_profile(&profile)?;
    session.save()?;

    if missing.is_empty() {
        println!("{}", "All columns are defined in the profile".green());
    }
    Ok(())
}
