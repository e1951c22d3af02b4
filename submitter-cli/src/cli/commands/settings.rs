//! `settings show` and `settings set`

use anyhow::Result;
use colored::*;

use super::session::Session;
use crate::cli::{GlobalArgs, SettingsCommands};
use crate::config::{Resolved, SheetSettings};
use crate::sheet::PropertyRole;

const LEGEND: [PropertyRole; 6] = [
    PropertyRole::Required,
    PropertyRole::Identifying,
    PropertyRole::AdminOnly,
    PropertyRole::Editable,
    PropertyRole::Commented,
    PropertyRole::Missing,
];

pub fn handle_settings(args: &GlobalArgs, command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Show => show(args),
        SettingsCommands::Set {
            key,
            value,
            default,
        } => {
            let mut session = Session::open(args, false)?;
            let target = if default {
                &mut session.settings.defaults
            } else {
                session.settings.sheet_mut(&session.sheet_name)
            };
            target.set(key, value);
            session.save_settings()?;
            session.refresh();
            println!(
                "{} {}",
                "Saved".green(),
                session.settings_path.display().to_string().bright_green()
            );
            print_resolved(&session);
            Ok(())
        }
    }
}

fn print_layer(title: &str, settings: &SheetSettings) {
    println!("{}", title.bold());
    let fields = [
        ("endpoint_read", &settings.endpoint_read),
        ("endpoint_write", &settings.endpoint_write),
        ("profile_name", &settings.profile_name),
        ("last_used_schema_version", &settings.last_used_schema_version),
    ];
    for (name, value) in fields {
        let value = value.as_deref().unwrap_or("-");
        println!("  {:<26} {}", name, value);
    }
}

fn print_value(name: &str, resolved: Option<&Resolved>) {
    match resolved {
        Some(r) => println!(
            "  {:<26} {} {}",
            name,
            r.value.cyan(),
            format!("({})", r.layer).dimmed()
        ),
        None => println!("  {:<26} {}", name, "not set".red()),
    }
}

fn print_resolved(session: &Session) {
    println!("{} '{}'", "Effective settings for sheet".bold(), session.sheet_name);
    print_value("endpoint_read", Some(&session.resolved.endpoint_read));
    print_value("endpoint_write", Some(&session.resolved.endpoint_write));
    print_value("profile_name", session.resolved.profile_name.as_ref());
    if let Some(version) = &session.resolved.last_used_schema_version {
        println!("  {:<26} {}", "last_used_schema_version", version);
    }
}

fn show(args: &GlobalArgs) -> Result<()> {
    let session = Session::open(args, false)?;

    print_resolved(&session);
    println!();

    let sheet_layer = session
        .settings
        .sheet(&session.sheet_name)
        .cloned()
        .unwrap_or_default();
    print_layer(&format!("Sheet '{}'", session.sheet_name), &sheet_layer);
    print_layer("Workbook defaults", &session.settings.defaults);
    print_layer("User config", &session.user);
    println!();

    println!("{}", "Header legend".bold());
    for role in LEGEND {
        println!("  {}", role.legend());
    }
    println!("  bold italic: array property (comma-separated values)");
    println!("  underline: searchable property (links to other objects)");
    Ok(())
}
