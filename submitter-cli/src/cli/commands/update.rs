//! `update-sheet`

use anyhow::{Context, Result, bail};
use colored::*;
use log::warn;

use super::session::{Session, confirm};
use super::sync::print_report;
use crate::cli::{GlobalArgs, RowArgs};
use crate::sheet::workbook::WorkbookFormat;
use crate::sync::{BatchOptions, rebuild_sheet_from_portal};

/// Suffix of rebuilt sheet names, e.g. `samples (updated)`
const UPDATED_SUFFIX: &str = "updated";

/// Rebuild one sheet, or every sheet, into new sheets under the current profile
pub async fn handle_update_sheet(
    args: &GlobalArgs,
    all: bool,
    for_admin: bool,
    rows: RowArgs,
) -> Result<()> {
    let mut session = Session::open(args, false)?;
    if WorkbookFormat::from_path(&session.workbook_path)? == WorkbookFormat::Csv {
        bail!("update-sheet adds sheets to the workbook, which needs an .xlsx file");
    }

    let targets: Vec<String> = if all {
        session
            .workbook
            .sheets()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    } else {
        vec![session.sheet_name.clone()]
    };

    if !confirm(
        &format!(
            "Rebuild {} into new sheet(s) with data from the portal?",
            targets
                .iter()
                .map(|t| format!("'{}'", t))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        args.yes,
    )? {
        return Ok(());
    }

    let options = BatchOptions {
        ignore_hidden_rows: !rows.include_hidden,
        for_admin,
        ..BatchOptions::default()
    };

    let mut rebuilt = 0;
    for name in &targets {
        match rebuild(&mut session, name, options).await {
            Ok(()) => rebuilt += 1,
            // One sheet without a profile or identifiers does not stop the others
            Err(e) if all => {
                warn!("Not rebuilding sheet '{}': {:#}", name, e);
                println!("{} '{}': {:#}", "Skipped".yellow(), name, e);
            }
            Err(e) => return Err(e),
        }
    }

    if rebuilt == 0 {
        bail!("No sheet could be rebuilt");
    }
    session.save()?;
    println!(
        "{} {} of {} sheet(s)",
        "Rebuilt".green(),
        rebuilt,
        targets.len()
    );
    Ok(())
}

async fn rebuild(session: &mut Session, name: &str, options: BatchOptions) -> Result<()> {
    let resolved = session.resolve_for(name);
    let profile = Session::fetch_profile_with(&resolved).await?;
    let client = Session::client(&resolved.endpoint_read.value)?;

    let new_name = session.workbook.unused_sheet_name(name, UPDATED_SUFFIX);
    let source = session
        .workbook
        .sheet(name)
        .with_context(|| format!("Sheet '{}' not found", name))?;
    let (sheet, report) =
        rebuild_sheet_from_portal(source, &new_name, &profile, &client, options).await?;

    session.workbook.add_sheet(sheet);
    session
        .settings
        .save_sheet_settings(&new_name, &resolved, profile.version.as_deref());

    println!("{} -> {}", name.bold(), new_name.bold());
    print_report(&report);
    Ok(())
}
