//! Python recipes from PyPI, sdist and `pyproject.toml` metadata.
//!
//! The three sources are consulted in that order: PyPI describes the
//! published release, the sdist metadata what its build backend reported,
//! and `pyproject.toml` the project as checked in. Scalar fields come from the
//! first source that has them and requirement lists are merged.

use anyhow::{Context, Result, bail};

use crate::config::Configuration;
use crate::metadata::pypi::{PyPiMetadata, extract_license};
use crate::metadata::pyproject::ProjectMetadata;
use crate::metadata::sdist::SdistMetadata;
use crate::python::py_version_to_limit_python;
use crate::python::selector::selector_expression;
use crate::recipe::Document;
use crate::requirements::tracking::{apply_tracking, import_name};
use crate::requirements::{
    NameRegistry, Requirement, RequirementSections, apply_pin_compatible,
    clean_deps_for_conda_forge, merge,
};
use crate::skeleton::Skeleton;

const PIP_INSTALL: &str = "{{ PYTHON }} -m pip install . -vv --no-deps --no-build-isolation";

/// The metadata a Python recipe is built from.
#[derive(Debug, Clone, Default)]
pub struct PythonSources {
    pub pypi: Option<PyPiMetadata>,
    pub sdist: Option<SdistMetadata>,
    pub project: Option<ProjectMetadata>,
}

impl PythonSources {
    fn name(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().map(|pypi| pypi.info.name.as_str()),
            self.sdist.as_ref().and_then(|sdist| sdist.name.as_deref()),
            self.project.as_ref().and_then(|project| project.name.as_deref()),
        ])
    }

    fn version(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().map(|pypi| pypi.info.version.as_str()),
            self.sdist.as_ref().and_then(|sdist| sdist.version.as_deref()),
            self.project.as_ref().and_then(|project| project.version.as_deref()),
        ])
    }

    fn requires_python(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().and_then(|pypi| pypi.info.requires_python.as_deref()),
            self.sdist.as_ref().and_then(|sdist| sdist.python_requires.as_deref()),
            self.project.as_ref().and_then(|project| project.requires_python.as_deref()),
        ])
    }

    fn summary(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().and_then(|pypi| pypi.info.summary.as_deref()),
            self.sdist.as_ref().and_then(|sdist| sdist.summary.as_deref()),
            self.project.as_ref().and_then(|project| project.summary.as_deref()),
        ])
    }

    fn home(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().and_then(|pypi| pypi.info.home()),
            self.sdist.as_ref().and_then(|sdist| sdist.url.as_deref()),
            self.project.as_ref().and_then(|project| project.home.as_deref()),
        ])
    }

    fn dev_url(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().and_then(|pypi| pypi.info.dev_url()),
            None,
            self.project.as_ref().and_then(|project| project.dev_url.as_deref()),
        ])
    }

    fn doc_url(&self) -> Option<&str> {
        first_of([
            self.pypi.as_ref().and_then(|pypi| pypi.info.doc_url()),
            None,
            self.project.as_ref().and_then(|project| project.doc_url.as_deref()),
        ])
    }

    /// Console scripts as `name = module:function`, without repeats.
    fn entry_points(&self) -> Vec<String> {
        let mut entry_points: Vec<String> = Vec::new();
        let sdist = self.sdist.iter().flat_map(|sdist| sdist.entry_points.scripts());
        let project = self
            .project
            .iter()
            .flat_map(|project| project.entry_points.iter().cloned());
        for entry_point in sdist.chain(project) {
            if !entry_points.contains(&entry_point) {
                entry_points.push(entry_point);
            }
        }
        entry_points
    }
}

fn first_of<const N: usize>(candidates: [Option<&str>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Requirement lines parsed for one recipe.
struct Collector<'a> {
    own_name: String,
    strict: bool,
    needs_arch: bool,
    registry: &'a dyn NameRegistry,
    warnings: Vec<String>,
}

impl Collector<'_> {
    /// Parse `Requires-Dist`-style or recipe-style lines, dropping the package
    /// itself and lines that only apply to extras.
    fn parse<'l>(&mut self, lines: impl IntoIterator<Item = &'l String>) -> Result<Vec<Requirement>> {
        let mut requirements = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let Some(dist) = Requirement::from_requires_dist(line)
                .with_context(|| format!("Invalid requirement `{line}`"))?
            else {
                continue;
            };
            if normalize(dist.requirement.name()) == self.own_name {
                continue;
            }
            self.needs_arch |= dist.needs_arch;
            let requirement = if self.strict {
                apply_tracking(dist.requirement)
            } else {
                dist.requirement
            };
            requirements.push(requirement);
        }
        Ok(requirements)
    }

    /// Merge lists, warning about names the registry does not know, and drop
    /// `python` and `pip`, which the recipe writes itself.
    fn merge(&mut self, sources: &[Vec<Requirement>]) -> Vec<Requirement> {
        let outcome = merge(sources, self.registry);
        self.warnings.extend(
            outcome
                .possibly_unavailable
                .iter()
                .map(|name| format!("`{name}` may not be available on conda-forge")),
        );
        outcome
            .requirements
            .into_iter()
            .filter(|requirement| !matches!(requirement.name(), "python" | "pip"))
            .collect()
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

fn compiler(language: &str) -> Requirement {
    Requirement::symbolic(format!("{{{{ compiler('{language}') }}}}"), None)
}

/// Build the recipe for a Python package.
pub fn python_recipe(
    sources: &PythonSources,
    config: &Configuration,
    registry: &dyn NameRegistry,
) -> Result<Skeleton> {
    let Some(name) = sources.name() else {
        bail!("No package name found in the given metadata");
    };
    let Some(version) = sources.version() else {
        bail!("No version found for `{name}`");
    };
    let mut document = Document::new(name, version)?;
    let mut collector = Collector {
        own_name: normalize(name),
        strict: config.strict_conda_forge,
        needs_arch: false,
        registry,
        warnings: Vec::new(),
    };

    let pypi = sources.pypi.as_ref();
    let sdist = sources.sdist.as_ref();
    let project = sources.project.as_ref();

    if let Some(release) = pypi.and_then(PyPiMetadata::sdist) {
        let filename = release.filename.replacen(version, "{{ version }}", 1);
        document.set(
            "source.url",
            format!("https://pypi.org/packages/source/{{{{ name[0] }}}}/{{{{ name }}}}/{filename}"),
        )?;
        if let Some(sha256) = release.digests.get("sha256") {
            document.set("source.sha256", sha256)?;
        }
    }

    let run_sources = [
        collector.parse(pypi.into_iter().flat_map(|pypi| pypi.info.requires_dist.iter().flatten()))?,
        collector.parse(sdist.into_iter().flat_map(|sdist| &sdist.install_requires))?,
        collector.parse(project.into_iter().flat_map(|project| &project.run))?,
    ];
    let host_sources = [
        collector.parse(sdist.into_iter().flat_map(|sdist| &sdist.setup_requires))?,
        collector.parse(project.into_iter().flat_map(|project| &project.host))?,
    ];
    let build_lines = collector.parse(project.into_iter().flat_map(|project| &project.build))?;
    let run_constrained =
        collector.parse(project.into_iter().flat_map(|project| &project.run_constrained))?;

    let mut host = collector.merge(&host_sources);
    let mut run = collector.merge(&run_sources);
    let mut run_constrained = collector.merge(&[run_constrained]);

    let mut compilers: Vec<Requirement> = Vec::new();
    for language in sdist.into_iter().flat_map(|sdist| &sdist.compilers) {
        compilers.push(compiler(language));
    }
    for requirement in &host {
        if config.c_compiler_packages.iter().any(|name| name == requirement.name()) {
            compilers.push(compiler("c"));
        }
        if config.cxx_compiler_packages.iter().any(|name| name == requirement.name()) {
            compilers.push(compiler("cxx"));
        }
    }
    let build = merge(&[compilers, build_lines], registry).requirements;
    let has_compiler = build
        .iter()
        .any(|requirement| requirement.name().contains("compiler("));

    if config.strict_conda_forge {
        if let Some(oldest) = config.oldest_python() {
            host = clean_deps_for_conda_forge(host, oldest);
            run = clean_deps_for_conda_forge(run, oldest);
            run_constrained = clean_deps_for_conda_forge(run_constrained, oldest);
        }
    }
    let guarded = host
        .iter()
        .chain(&run)
        .any(|requirement| requirement.guard().is_some());
    let needs_arch = if config.strict_conda_forge {
        guarded
    } else {
        collector.needs_arch || guarded
    };
    let noarch = !has_compiler && !needs_arch;
    tracing::debug!("`{name}`: compiler={has_compiler}, guarded={guarded}, noarch={noarch}");

    let requires_python = sources.requires_python().unwrap_or_default();
    let python: Requirement = if noarch {
        match py_version_to_limit_python(requires_python, config) {
            Some(limit) => format!("python {limit}").parse()?,
            None => "python".parse()?,
        }
    } else {
        "python".parse()?
    };

    if !noarch {
        if let Some(selector) = selector_expression(requires_python, config) {
            document.set_with_guard("build.skip", true, Some(selector))?;
        }
    }
    if noarch {
        document.set("build.noarch", "python")?;
    }
    let entry_points = sources.entry_points();
    for entry_point in &entry_points {
        document.add_item("build.entry_points", entry_point, None)?;
    }
    document.set("build.script", PIP_INSTALL)?;
    document.set("build.number", 0_i64)?;

    let mut sections = RequirementSections {
        build,
        host: [python.clone(), "pip".parse()?].into_iter().chain(host).collect(),
        run: std::iter::once(python).chain(run).collect(),
        run_constrained,
    };
    apply_pin_compatible(&mut sections, &config.pin_compatible);
    for (key, requirements) in sections.iter() {
        for requirement in requirements {
            document.add_item(
                &format!("requirements.{key}"),
                requirement.spec(),
                requirement.guard().map(str::to_string),
            )?;
        }
    }

    let packages: Vec<&String> = sdist
        .iter()
        .flat_map(|sdist| &sdist.packages)
        .filter(|package| !package.contains('.'))
        .collect();
    if packages.is_empty() {
        document.add_item("test.imports", import_name(&name.to_lowercase()), None)?;
    } else {
        for package in packages {
            document.add_item("test.imports", package, None)?;
        }
    }
    document.add_item("test.commands", "pip check", None)?;
    for entry_point in &entry_points {
        if let Some((script, _)) = entry_point.split_once('=') {
            document.add_item("test.commands", format!("{} --help", script.trim()), None)?;
        }
    }
    document.add_item("test.requires", "pip", None)?;

    if let Some(home) = sources.home() {
        document.set("about.home", home)?;
    }
    if let Some(summary) = sources.summary() {
        document.set("about.summary", summary)?;
    }
    let license = match pypi.and_then(|pypi| extract_license(&pypi.info)) {
        Some(license) => {
            collector.warnings.extend(license.warning);
            Some(license.spdx)
        }
        None => first_of([
            sdist.and_then(|sdist| sdist.license.as_deref()),
            project.and_then(|project| project.license.as_deref()),
        ])
        .map(str::to_string),
    };
    match license {
        Some(license) => document.set("about.license", license)?,
        None => collector
            .warnings
            .push(format!("No license found for `{name}`, please add one")),
    }
    if let Some(dev_url) = sources.dev_url() {
        document.set("about.dev_url", dev_url)?;
    }
    if let Some(doc_url) = sources.doc_url() {
        document.set("about.doc_url", doc_url)?;
    }

    for maintainer in &config.maintainers {
        document.add_item("extra.recipe-maintainers", maintainer, None)?;
    }

    document.reduce_all();
    Ok(Skeleton {
        document,
        warnings: collector.warnings,
    })
}
