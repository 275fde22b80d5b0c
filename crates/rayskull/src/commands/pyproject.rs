//! `rayskull pyproject`: a Python recipe from a checked-in `pyproject.toml`.

use anyhow::Result;

use crate::cli::PyprojectArgs;
use crate::commands::{ExitStatus, emit_recipe, load_configuration, load_registry};
use crate::metadata::pyproject::ProjectMetadata;
use crate::printer::Printer;
use crate::skeleton::python::{PythonSources, python_recipe};

pub(crate) fn execute(args: &PyprojectArgs, printer: Printer) -> Result<ExitStatus> {
    let config = load_configuration(&args.recipe)?;
    let registry = load_registry(args.recipe.available.as_deref())?;

    let project = ProjectMetadata::from_path(&args.path)?;
    let sources = PythonSources {
        project: Some(project),
        ..PythonSources::default()
    };
    let skeleton = python_recipe(&sources, &config, registry.as_ref())?;
    emit_recipe(&skeleton, args.recipe.output.as_deref(), printer)
}
