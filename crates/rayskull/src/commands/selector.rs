//! `rayskull selector`: the skip selector and python limit for a
//! `requires-python` value.

use std::fmt::Write;

use anyhow::Result;

use crate::cli::{RecipeOptions, SelectorArgs};
use crate::commands::{ExitStatus, load_configuration};
use crate::printer::Printer;
use crate::python::{parse_requires_python, py_version_to_limit_python, py_version_to_selector};

pub(crate) fn execute(args: &SelectorArgs, printer: Printer) -> Result<ExitStatus> {
    let mut config = load_configuration(&RecipeOptions {
        strict_conda_forge: args.strict,
        ..RecipeOptions::default()
    })?;
    if !args.baseline.is_empty() {
        if config.strict_conda_forge {
            config.conda_forge_python.clone_from(&args.baseline);
        } else {
            config.supported_python.clone_from(&args.baseline);
        }
    }

    let requires_python = args.requires_python.as_str();
    let matrix = config.support_matrix(&parse_requires_python(requires_python));
    // Versions only named by a clause do not count as supported interpreters.
    let baseline = config.baseline_python();
    if !baseline.is_empty()
        && baseline
            .iter()
            .all(|version| matrix.is_enabled(*version) == Some(false))
    {
        printer.warn(&format!(
            "`{requires_python}` excludes every supported interpreter"
        ));
        return Ok(ExitStatus::Failure);
    }

    let mut out = String::new();
    if let Some(selector) = py_version_to_selector(requires_python, &config) {
        writeln!(out, "selector: {selector}")?;
    }
    if let Some(limit) = py_version_to_limit_python(requires_python, &config) {
        writeln!(out, "limit: {limit}")?;
    }

    if out.is_empty() {
        printer.info(&format!(
            "`{requires_python}` allows every supported interpreter"
        ));
    } else {
        printer.result(&out)?;
    }
    Ok(ExitStatus::Success)
}
