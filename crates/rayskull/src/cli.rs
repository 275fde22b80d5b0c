//! CLI argument definitions for rayskull.
//!
//! All clap derive structs live here. The [`Cli`] struct is the top-level
//! parser; [`Commands`] enumerates every subcommand.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

use crate::python::PyVer;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Generate conda recipes from package metadata.
#[derive(Parser, Debug)]
#[command(
    name = "rayskull",
    author,
    version,
    about = "Generate conda recipes from package metadata.",
    styles = STYLES,
    after_help = "Use `rayskull help <command>` for more information on a specific command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity.
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except the result.
    #[arg(global = true, short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a recipe from PyPI release metadata.
    Pypi(PypiArgs),

    /// Generate a recipe from a `pyproject.toml`.
    Pyproject(PyprojectArgs),

    /// Generate an R recipe from a CRAN `DESCRIPTION` file.
    Cran(CranArgs),

    /// Print the skip selector and python limit for a `requires-python` value.
    Selector(SelectorArgs),

    /// Merge requirement records into conda requirement lines.
    Merge(MergeArgs),
}

impl Commands {
    /// Return the subcommand name as a static string (for diagnostics).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pypi(_) => "pypi",
            Self::Pyproject(_) => "pyproject",
            Self::Cran(_) => "cran",
            Self::Selector(_) => "selector",
            Self::Merge(_) => "merge",
        }
    }
}

/// Options shared by the commands that write a recipe.
#[derive(Args, Debug, Default)]
pub struct RecipeOptions {
    /// Follow conda-forge rules, overriding the configuration file.
    #[arg(long)]
    pub strict_conda_forge: bool,

    /// Read the conda-forge package names from a file, one per line.
    ///
    /// Without it every name is assumed to exist.
    #[arg(long, value_name = "FILE")]
    pub available: Option<PathBuf>,

    /// Write the recipe to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for `rayskull pypi`.
#[derive(Parser, Debug)]
pub struct PypiArgs {
    /// The PyPI JSON API response for the release.
    pub info: PathBuf,

    /// What the build backend reported for the source distribution, as JSON.
    #[arg(long, value_name = "JSON")]
    pub sdist_metadata: Option<PathBuf>,

    /// The project's `pyproject.toml`.
    #[arg(long, value_name = "TOML")]
    pub pyproject: Option<PathBuf>,

    #[command(flatten)]
    pub recipe: RecipeOptions,
}

/// Arguments for `rayskull pyproject`.
#[derive(Parser, Debug)]
pub struct PyprojectArgs {
    /// Path to `pyproject.toml`.
    pub path: PathBuf,

    #[command(flatten)]
    pub recipe: RecipeOptions,
}

/// Arguments for `rayskull cran`.
#[derive(Parser, Debug)]
pub struct CranArgs {
    /// Path to the package's `DESCRIPTION` file.
    pub description: PathBuf,

    /// Write the recipe to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for `rayskull selector`.
#[derive(Parser, Debug)]
pub struct SelectorArgs {
    /// The `requires-python` expression, e.g. `>=3.8,<4`.
    pub requires_python: String,

    /// Interpreters to check against instead of the configured ones.
    #[arg(long, value_delimiter = ',', value_name = "VERSIONS")]
    pub baseline: Vec<PyVer>,

    /// Follow conda-forge rules.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `rayskull merge`.
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// JSON files, each holding an array of requirement records.
    #[arg(required = true)]
    pub records: Vec<PathBuf>,

    /// Read the conda-forge package names from a file, one per line.
    #[arg(long, value_name = "FILE")]
    pub available: Option<PathBuf>,
}
