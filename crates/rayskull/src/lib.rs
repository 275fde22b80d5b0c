//! rayskull: generate conda recipes from package metadata.
//!
//! The library turns PyPI release metadata, `pyproject.toml` files and CRAN
//! `DESCRIPTION` files into `meta.yaml` recipes. The binary is a thin layer
//! over [`main`], which parses arguments, sets up logging and dispatches to
//! the command handlers in [`commands`].

#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::ffi::OsString;
use std::io::IsTerminal;
use std::process::ExitCode;

use anstream::eprintln;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::ExitStatus;
use crate::printer::Printer;

pub mod cli;
pub mod commands;
pub mod config;
pub mod marker;
pub mod metadata;
pub mod printer;
pub mod python;
pub mod recipe;
pub mod requirements;
pub mod skeleton;
pub mod version;

/// Entry point for the rayskull CLI.
pub fn main<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    setup_logging(cli.verbose, cli.quiet);
    let printer = Printer::new(cli.verbose, cli.quiet);

    match commands::dispatch(cli.command, printer) {
        Ok(code) => code.into(),
        Err(err) => {
            let mut causes = err.chain();
            if let Some(error) = causes.next() {
                printer.error(&error.to_string());
            }
            for cause in causes {
                eprintln!(
                    "  {}: {}",
                    "Caused by".red().bold(),
                    cause.to_string().trim()
                );
            }
            ExitStatus::Error.into()
        }
    }
}

/// Send `tracing` output to stderr. `RAYSKULL_LOG` takes a filter directive;
/// otherwise the level follows `-v`.
fn setup_logging(verbosity: u8, quiet: bool) {
    let default = match (quiet, verbosity) {
        (true, _) => "off",
        (false, 0) => "rayskull=warn",
        (false, 1) => "rayskull=debug",
        (false, _) => "rayskull=trace",
    };
    let filter = EnvFilter::try_from_env("RAYSKULL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
