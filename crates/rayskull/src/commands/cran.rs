//! `rayskull cran`: an R recipe from a `DESCRIPTION` file.

use anyhow::{Context, Result};

use crate::cli::{CranArgs, RecipeOptions};
use crate::commands::{ExitStatus, emit_recipe, load_configuration};
use crate::metadata::cran::Description;
use crate::printer::Printer;
use crate::skeleton::cran::cran_recipe;

pub(crate) fn execute(args: &CranArgs, printer: Printer) -> Result<ExitStatus> {
    let config = load_configuration(&RecipeOptions::default())?;
    let content = fs_err::read_to_string(&args.description)?;
    let description = Description::parse(&content)
        .with_context(|| format!("Failed to parse `{}`", args.description.display()))?;
    let skeleton = cran_recipe(&description, &config)?;
    emit_recipe(&skeleton, args.output.as_deref(), printer)
}
