//! `rayskull pypi`: a Python recipe from PyPI release metadata.

use anyhow::{Context, Result};

use crate::cli::PypiArgs;
use crate::commands::{ExitStatus, emit_recipe, load_configuration, load_registry};
use crate::metadata::pypi::PyPiMetadata;
use crate::metadata::pyproject::ProjectMetadata;
use crate::metadata::sdist::SdistMetadata;
use crate::printer::Printer;
use crate::skeleton::python::{PythonSources, python_recipe};

pub(crate) fn execute(args: &PypiArgs, printer: Printer) -> Result<ExitStatus> {
    let config = load_configuration(&args.recipe)?;
    let registry = load_registry(args.recipe.available.as_deref())?;

    let content = fs_err::read_to_string(&args.info)?;
    let pypi = PyPiMetadata::from_json(&content)
        .with_context(|| format!("Failed to parse `{}`", args.info.display()))?;
    printer.debug(&format!("Release {} {}", pypi.info.name, pypi.info.version));

    let sdist = match &args.sdist_metadata {
        Some(path) => {
            let content = fs_err::read_to_string(path)?;
            let sdist = SdistMetadata::from_json(&content)
                .with_context(|| format!("Failed to parse `{}`", path.display()))?;
            Some(sdist)
        }
        None => None,
    };
    let project = args
        .pyproject
        .as_deref()
        .map(ProjectMetadata::from_path)
        .transpose()?;

    let sources = PythonSources {
        pypi: Some(pypi),
        sdist,
        project,
    };
    let skeleton = python_recipe(&sources, &config, registry.as_ref())?;
    emit_recipe(&skeleton, args.recipe.output.as_deref(), printer)
}
