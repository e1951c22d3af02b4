//! `validate`

use anyhow::Result;
use colored::*;

use super::session::Session;
use crate::cli::{GlobalArgs, RowArgs};
use crate::sync::{MapperOptions, validate_sheet};

/// Check every eligible row locally and record the verdicts in the sheet
pub async fn handle_validate(args: &GlobalArgs, rows: RowArgs) -> Result<()> {
    let mut session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;

    let options = MapperOptions {
        ignore_hidden_rows: !rows.include_hidden,
        ..MapperOptions::default()
    };
    let report = validate_sheet(session.sheet_mut()?, &profile, options)?;

    session.apply_profile(&profile)?;
    session.save()?;

    for row in report.rows.iter().filter(|r| !r.issues.is_empty()) {
        for issue in &row.issues {
            println!("  row {}: {}", row.row, issue);
        }
    }
    let mut summary = format!(
        "Validated {} row(s): {} valid, {} invalid",
        report.validated(),
        report.valid_count(),
        report.invalid_count()
    );
    // Those columns were ignored, so the verdicts do not cover them
    if !report.missing_properties.is_empty() {
        summary.push_str(&format!(
            " ({} column(s) ignored: {})",
            report.missing_properties.len(),
            report.missing_properties.join(", ")
        ));
    }
    if report.invalid_count() == 0 {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
    Ok(())
}
