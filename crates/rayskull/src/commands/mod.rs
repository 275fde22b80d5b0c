//! Command dispatch for rayskull.
//!
//! Each subcommand has its own module. The helpers here load what several
//! commands share: the configuration, the package-name registry and the
//! recipe output.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::cli::{self, RecipeOptions};
use crate::config::Configuration;
use crate::printer::Printer;
use crate::requirements::{CachedRegistry, NameRegistry, NoopRegistry, StaticRegistry};
use crate::skeleton::Skeleton;

mod cran;
mod merge;
mod pypi;
mod pyproject;
mod selector;

/// Exit status for rayskull commands.
#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The command ran but the input admits no result.
    Failure,

    /// The command failed with an error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
            ExitStatus::Error => Self::from(2),
        }
    }
}

/// Dispatch a parsed CLI command to the appropriate handler.
pub fn dispatch(command: cli::Commands, printer: Printer) -> Result<ExitStatus> {
    tracing::debug!("Running `rayskull {}`", command.name());
    match command {
        cli::Commands::Pypi(args) => pypi::execute(&args, printer),
        cli::Commands::Pyproject(args) => pyproject::execute(&args, printer),
        cli::Commands::Cran(args) => cran::execute(&args, printer),
        cli::Commands::Selector(args) => selector::execute(&args, printer),
        cli::Commands::Merge(args) => merge::execute(&args, printer),
    }
}

/// The configuration for the working directory, with `--strict-conda-forge`
/// applied on top.
fn load_configuration(options: &RecipeOptions) -> Result<Configuration> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let mut config = Configuration::discover(&cwd)?;
    if options.strict_conda_forge {
        config.strict_conda_forge = true;
    }
    Ok(config)
}

/// A registry of the names listed in `available`, or one that accepts every
/// name when no file is given.
fn load_registry(available: Option<&Path>) -> Result<Box<dyn NameRegistry>> {
    let Some(path) = available else {
        return Ok(Box::new(NoopRegistry));
    };
    let content = fs_err::read_to_string(path)?;
    let names: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    tracing::debug!("Loaded {} package names from `{}`", names.len(), path.display());
    Ok(Box::new(CachedRegistry::new(StaticRegistry::new(names))))
}

/// Print the skeleton's warnings, then write the recipe to `output` or stdout.
fn emit_recipe(skeleton: &Skeleton, output: Option<&Path>, printer: Printer) -> Result<ExitStatus> {
    for warning in &skeleton.warnings {
        printer.warn(warning);
    }
    let text = skeleton.document.render()?;
    match output {
        Some(path) => {
            fs_err::write(path, text)?;
            printer.info(&format!("Wrote recipe to `{}`", path.display()));
        }
        None => printer.result(&text)?,
    }
    Ok(ExitStatus::Success)
}
