mod api;
mod cli;
mod config;
mod sheet;
mod sync;

use clap::Parser;
use colored::*;
use log::LevelFilter;
use std::process::ExitCode;

use cli::Cli;
use sync::SyncError;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG wins over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Credentials may come from a .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli::commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code_for_error(&e)
        }
    }
}

/// 2 when a batch was refused before any row work, 1 otherwise
fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    let refused = err
        .chain()
        .any(|cause| cause.downcast_ref::<SyncError>().is_some_and(SyncError::is_batch_fatal));
    if refused {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
