//! Demo runner for the portfolio sagas.
//!
//! Runs either saga against built-in sample data, streaming step progress
//! to stdout. Failure injection flags exercise the rollback paths.

mod commands;
mod demo;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;

use crate::commands::Commands;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "portfolio-saga")]
#[command(version, about = "Run portfolio sagas with compensating rollback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command.execute() {
        Ok(code) => code,
        Err(error) => {
            print_error(&error);
            ExitCode::FAILURE
        }
    }
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = cause.source();
    }
}
