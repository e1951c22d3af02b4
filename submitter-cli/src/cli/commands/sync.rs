//! `get`, `put`, `post` and `patch`

use anyhow::Result;
use colored::*;

use super::session::{Session, confirm};
use crate::cli::{GlobalArgs, RowArgs};
use crate::sheet::columns::column_letters;
use crate::sync::{
    BatchOptions, BatchReport, ColumnSelection, SubmitMethod, get_selected_columns,
    submit_sheet_to_portal, update_sheet_from_portal,
};

pub(super) fn print_report(report: &BatchReport) {
    println!(
        "{} {} row(s) succeeded, {} failed, {} skipped",
        report.method.bold(),
        report.succeeded().to_string().green(),
        report.failed().to_string().red(),
        report.skipped().to_string().dimmed()
    );
    for outcome in report.failures() {
        println!("  row {}: {}", outcome.row, outcome.message.red());
    }
}

/// Fill rows from the read endpoint
pub async fn handle_get(args: &GlobalArgs, for_admin: bool, rows: RowArgs) -> Result<()> {
    let mut session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;
    let client = session.read_client()?;

    let options = BatchOptions {
        ignore_hidden_rows: !rows.include_hidden,
        for_admin,
        ..BatchOptions::default()
    };
    let count = session.sheet()?.num_metadata_rows(options.ignore_hidden_rows);
    if !confirm(
        &format!(
            "Overwrite {} row(s) of '{}' with data from {}?",
            count, session.sheet_name, session.resolved.endpoint_read.value
        ),
        args.yes,
    )? {
        return Ok(());
    }

    let report = update_sheet_from_portal(session.sheet_mut()?, &profile, &client, options).await?;

    session.apply_profile(&profile)?;
    session.pin_settings(&profile);
    session.save()?;
    print_report(&report);
    Ok(())
}

/// Submit rows to the write endpoint
pub async fn handle_submit(
    args: &GlobalArgs,
    method: SubmitMethod,
    columns: Option<String>,
    validate_first: bool,
    rows: RowArgs,
) -> Result<()> {
    let mut session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;
    let client = session.write_client()?;

    let options = BatchOptions {
        ignore_hidden_rows: !rows.include_hidden,
        validate_first,
        ..BatchOptions::default()
    };

    let selected = match &columns {
        Some(spec) => {
            let sheet = session.sheet()?;
            let selection = ColumnSelection::parse(spec, sheet)?;
            Some(get_selected_columns(sheet, &selection, false))
        }
        None => None,
    };

    let count = session.sheet()?.num_metadata_rows(options.ignore_hidden_rows);
    let scope = match &selected {
        Some(cols) => format!(
            " (columns: {})",
            cols.iter()
                .map(|c| format!("{} [{}]", c.header_prop, column_letters(c.col)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        None => String::new(),
    };
    if !confirm(
        &format!(
            "{} {} row(s) of '{}' to {}{}?",
            method.http_method(),
            count,
            session.sheet_name,
            session.resolved.endpoint_write.value,
            scope
        ),
        args.yes,
    )? {
        return Ok(());
    }

    let report = submit_sheet_to_portal(
        session.sheet_mut()?,
        &profile,
        &client,
        method,
        selected.as_deref(),
        options,
    )
    .await?;

    session.apply_profile(&profile)?;
    if method == SubmitMethod::Post || selected.is_some() {
        session.pin_settings(&profile);
    }
    session.save()?;
    print_report(&report);
    Ok(())
}
