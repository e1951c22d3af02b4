//! `row-json` and `export`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::*;
use serde_json::Value;

use super::session::Session;
use crate::cli::{GlobalArgs, RowArgs};
use crate::sheet::HEADER_ROW;
use crate::sync::{
    EXPORTED_JSON_INDENT, MapperOptions, export_sheet_to_json, row_to_object, to_json_pretty,
};

/// Print one row's object
pub async fn handle_row_json(args: &GlobalArgs, row: usize) -> Result<()> {
    let session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;
    let sheet = session.sheet()?;

    if row <= HEADER_ROW || row > sheet.last_row() {
        bail!(
            "Row {} is not a data row of '{}' (rows {}..={})",
            row,
            sheet.name(),
            HEADER_ROW + 1,
            sheet.last_row()
        );
    }

    let object = row_to_object(sheet, row, &profile, false);
    let text = to_json_pretty(&Value::Object(object), EXPORTED_JSON_INDENT)
        .context("Failed to format row as JSON")?;
    println!("{}", text);
    Ok(())
}

/// Print or write every eligible row as a JSON array
pub async fn handle_export(args: &GlobalArgs, output: Option<PathBuf>, rows: RowArgs) -> Result<()> {
    let session = Session::open(args, false)?;
    let profile = session.fetch_profile().await?;
    let sheet = session.sheet()?;

    let options = MapperOptions {
        ignore_hidden_rows: !rows.include_hidden,
        ..MapperOptions::default()
    };
    let text = export_sheet_to_json(sheet, &profile, options, EXPORTED_JSON_INDENT)
        .context("Failed to format sheet as JSON")?;

    match output {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!("Failed to write output to: {}", path.display()))?;
            println!(
                "{} {}",
                "Exported to".green(),
                path.display().to_string().bright_green()
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}
