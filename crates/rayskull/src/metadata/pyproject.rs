//! `pyproject.toml`: PEP 621 `[project]`, `[build-system]`, Poetry, Flit and
//! PEP 725 `[external]` tables.
//!
//! Everything is flattened into a [`ProjectMetadata`], whose requirement
//! lists are already conda-style lines (`name constraint  # [guard]`).

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::marker;
use crate::metadata::MetadataError;
use crate::python::specifier::{
    combine_selectors, encode_poetry_platform_to_selector_item,
    encode_poetry_python_version_to_selector_item,
};
use crate::version::VersionError;
use crate::version::poetry::encode_poetry_version;

/// Top-level `pyproject.toml` structure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PyProjectToml {
    pub project: Option<Project>,
    pub build_system: Option<BuildSystem>,
    pub tool: Option<Tool>,
    pub external: Option<External>,
}

/// The PEP 621 `[project]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Project {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub license: Option<License>,
    pub requires_python: Option<String>,
    pub dependencies: Vec<String>,
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
    pub urls: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub gui_scripts: BTreeMap<String, String>,
}

/// `license = "MIT"` or `license = { text = "MIT" }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum License {
    Expression(String),
    Table {
        text: Option<String>,
        file: Option<String>,
    },
}

impl License {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Expression(expression) => Some(expression),
            Self::Table { text, .. } => text.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildSystem {
    pub requires: Vec<String>,
    pub build_backend: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Tool {
    pub poetry: Option<Poetry>,
    pub flit: Option<Flit>,
}

/// The `[tool.poetry]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Poetry {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
    pub dependencies: BTreeMap<String, PoetryDependency>,
    pub group: BTreeMap<String, PoetryGroup>,
    pub scripts: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PoetryGroup {
    pub dependencies: BTreeMap<String, PoetryDependency>,
}

/// A Poetry dependency specification.
///
/// Poetry dependencies can be a version string (`"^1.2"`), a table
/// (`{ version = "^1.2", python = "<3.8" }`) or a list of tables with one
/// entry per python/platform combination.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PoetryDependency {
    Version(String),
    Detailed(PoetryDependencyDetail),
    Multiple(Vec<PoetryDependencyDetail>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PoetryDependencyDetail {
    pub version: Option<String>,
    pub optional: bool,
    pub python: Option<String>,
    pub platform: Option<String>,
    pub markers: Option<String>,
    pub extras: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Flit {
    pub scripts: BTreeMap<String, String>,
}

/// The PEP 725 `[external]` table. Entries are PURLs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct External {
    pub build_requires: Vec<String>,
    pub host_requires: Vec<String>,
    pub dependencies: Vec<String>,
}

/// What a `pyproject.toml` says about a package, in recipe terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub home: Option<String>,
    pub dev_url: Option<String>,
    pub doc_url: Option<String>,
    pub requires_python: Option<String>,
    pub build: Vec<String>,
    pub host: Vec<String>,
    pub run: Vec<String>,
    pub run_constrained: Vec<String>,
    pub test_requires: Vec<String>,
    pub entry_points: Vec<String>,
}

impl ProjectMetadata {
    /// Read and flatten a `pyproject.toml` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse `{}`", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, MetadataError> {
        let pyproject: PyProjectToml = toml::from_str(content)?;
        Self::from_pyproject(&pyproject)
    }

    pub fn from_pyproject(pyproject: &PyProjectToml) -> Result<Self, MetadataError> {
        let mut metadata = Self::default();
        if let Some(build_system) = &pyproject.build_system {
            metadata.host.extend(build_system.requires.iter().cloned());
        }
        if let Some(project) = &pyproject.project {
            metadata.add_project(project);
        }
        if let Some(tool) = &pyproject.tool {
            if let Some(poetry) = &tool.poetry {
                metadata.add_poetry(poetry)?;
            }
            if let Some(flit) = &tool.flit {
                metadata
                    .entry_points
                    .extend(flit.scripts.iter().map(|(name, path)| format!("{name} = {path}")));
            }
        }
        if let Some(external) = &pyproject.external {
            metadata.build.extend(external.build_requires.iter().map(|purl| map_purl(purl)));
            metadata.host.extend(external.host_requires.iter().map(|purl| map_purl(purl)));
            metadata.run.extend(external.dependencies.iter().map(|purl| map_purl(purl)));
        }
        Ok(metadata)
    }

    fn add_project(&mut self, project: &Project) {
        self.name.clone_from(&project.name);
        self.version.clone_from(&project.version);
        self.summary.clone_from(&project.description);
        self.license = project.license.as_ref().and_then(License::text).map(str::to_string);
        self.requires_python.clone_from(&project.requires_python);
        self.run.extend(project.dependencies.iter().cloned());

        if let Some(tests) = ["testing", "test", "tests"]
            .iter()
            .find_map(|extra| project.optional_dependencies.get(*extra))
        {
            self.test_requires.extend(tests.iter().cloned());
        }

        self.home = project.urls.get("Homepage").cloned();
        self.dev_url = project.urls.get("Source").cloned();
        self.doc_url = project.urls.get("Documentation").cloned();
        self.entry_points.extend(
            project
                .scripts
                .iter()
                .chain(&project.gui_scripts)
                .map(|(name, path)| format!("{name} = {path}")),
        );
    }

    fn add_poetry(&mut self, poetry: &Poetry) -> Result<(), MetadataError> {
        if self.name.is_none() {
            self.name.clone_from(&poetry.name);
        }
        if self.version.is_none() {
            self.version.clone_from(&poetry.version);
        }
        if self.summary.is_none() {
            self.summary.clone_from(&poetry.description);
        }
        if self.license.is_none() {
            self.license.clone_from(&poetry.license);
        }
        if self.home.is_none() {
            self.home.clone_from(&poetry.homepage);
        }
        if self.dev_url.is_none() {
            self.dev_url.clone_from(&poetry.repository);
        }
        if self.doc_url.is_none() {
            self.doc_url.clone_from(&poetry.documentation);
        }

        for (name, dependency) in &poetry.dependencies {
            if name == "python" {
                if let PoetryDependency::Version(spec) = dependency {
                    if self.requires_python.is_none() {
                        self.requires_python = Some(encode_poetry_version(spec)?);
                    }
                }
                continue;
            }
            for (line, optional) in poetry_lines(name, dependency)? {
                if optional {
                    self.run_constrained.push(line);
                } else {
                    self.run.push(line);
                }
            }
        }

        if let Some(test) = poetry.group.get("test") {
            for (name, dependency) in &test.dependencies {
                let lines = poetry_lines(name, dependency)?;
                self.test_requires
                    .extend(lines.into_iter().filter(|(_, optional)| !optional).map(|(line, _)| line));
            }
        }

        for (name, script) in &poetry.scripts {
            if let Some(path) = script.as_str() {
                self.entry_points.push(format!("{name} = {path}"));
            }
        }

        if !self.host.iter().any(|requirement| requirement.starts_with("poetry")) {
            self.host.push("poetry-core".to_string());
        }
        Ok(())
    }
}

/// Recipe lines for one Poetry dependency, each flagged as optional or not.
fn poetry_lines(name: &str, dependency: &PoetryDependency) -> Result<Vec<(String, bool)>, VersionError> {
    match dependency {
        PoetryDependency::Version(spec) => Ok(vec![(requirement_line(name, spec, "")?, false)]),
        PoetryDependency::Detailed(detail) => Ok(vec![detail_line(name, detail)?]),
        PoetryDependency::Multiple(details) => details
            .iter()
            .map(|detail| detail_line(name, detail))
            .collect(),
    }
}

fn detail_line(name: &str, detail: &PoetryDependencyDetail) -> Result<(String, bool), VersionError> {
    let python = encode_poetry_python_version_to_selector_item(detail.python.as_deref().unwrap_or_default())?;
    let platform = encode_poetry_platform_to_selector_item(detail.platform.as_deref().unwrap_or_default());
    let mut selector = combine_selectors(&python, platform);
    if selector.is_empty() {
        if let Some(guard) = detail
            .markers
            .as_deref()
            .and_then(|markers| marker::translate(markers).guard)
        {
            selector = format!("  # [{guard}]");
        }
    }
    let line = requirement_line(name, detail.version.as_deref().unwrap_or_default(), &selector)?;
    Ok((line, detail.optional))
}

fn requirement_line(name: &str, spec: &str, selector: &str) -> Result<String, VersionError> {
    let constraint = match spec.trim() {
        "" | "*" => String::new(),
        spec => encode_poetry_version(spec)?,
    };
    Ok(if constraint.is_empty() {
        format!("{name}{selector}")
    } else {
        format!("{name} {constraint}{selector}")
    })
}

/// Map a PEP 725 PURL to a conda package or template expression.
/// Unknown PURLs are kept as they are.
pub fn map_purl(purl: &str) -> String {
    let purl = purl.trim();
    let mapped = match purl {
        "virtual:compiler/c" => "{{ compiler('c') }}",
        "virtual:compiler/cpp" => "{{ compiler('cxx') }}",
        "virtual:compiler/fortran" => "{{ compiler('fortran') }}",
        "virtual:compiler/rust" => "{{ compiler('rust') }}",
        "virtual:interface/blas" => "blas",
        "pkg:generic/boost" => "boost-cpp",
        "pkg:generic/flint" => "libflint",
        "pkg:generic/gap" => "gap-defaults",
        _ => {
            return purl
                .strip_prefix("pkg:generic/")
                .unwrap_or(purl)
                .to_string();
        }
    };
    mapped.to_string()
}
