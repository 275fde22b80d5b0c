//! Configuration: supported interpreters, conda-forge strictness and the
//! per-package tables used while building recipes.
//!
//! Settings are read from a `rayskull.toml`, found by walking up from the
//! working directory. `RAYSKULL_CONFIG` points at an explicit file and
//! `RAYSKULL_MAX_DEPTH` bounds the walk.
//!
//! ```toml
//! strict-conda-forge = true
//! supported-python = ["3.8", "3.9", "3.10"]
//!
//! [pin-compatible]
//! numpy = "{{ pin_compatible('numpy') }}"
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::python::{InterpreterClause, PyVer, SupportMatrix};

/// Default maximum directory traversal depth.
const DEFAULT_MAX_DEPTH: usize = 3;

/// The filename we're looking for.
const CONFIG_NAME: &str = "rayskull.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Interpreters a recipe is expected to build for.
    pub supported_python: Vec<PyVer>,
    /// Interpreters currently built by conda-forge.
    pub conda_forge_python: Vec<PyVer>,
    /// Follow conda-forge rules: no legacy Python 2 selectors, always a
    /// `python` floor, and package-tracking renames.
    pub strict_conda_forge: bool,
    /// Host packages that imply a C compiler.
    pub c_compiler_packages: Vec<String>,
    /// Host packages that imply a C++ compiler.
    pub cxx_compiler_packages: Vec<String>,
    /// Packages whose run requirement is pinned to the build-time version.
    pub pin_compatible: BTreeMap<String, String>,
    pub maintainers: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut supported_python = vec![PyVer::new(2, 7)];
        supported_python.extend((6..=12).map(|minor| PyVer::new(3, minor)));
        Self {
            supported_python,
            conda_forge_python: (7..=12).map(|minor| PyVer::new(3, minor)).collect(),
            strict_conda_forge: false,
            c_compiler_packages: vec!["cython".into(), "cython-blis".into(), "blis".into()],
            cxx_compiler_packages: vec!["pybind11".into()],
            pin_compatible: BTreeMap::from([(
                "numpy".to_string(),
                "{{ pin_compatible('numpy') }}".to_string(),
            )]),
            maintainers: vec!["AddYourGitHubIdHere".to_string()],
        }
    }
}

impl Configuration {
    /// Parse a `rayskull.toml` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse `{}`", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the nearest configuration file, or the defaults when there is none.
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match find_config(start_dir)? {
            Some(path) => {
                tracing::debug!("Using configuration from `{}`", path.display());
                Self::from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// The interpreters recipes are checked against: the conda-forge list in
    /// strict mode, `supported-python` otherwise.
    pub fn baseline_python(&self) -> &[PyVer] {
        if self.strict_conda_forge {
            &self.conda_forge_python
        } else {
            &self.supported_python
        }
    }

    /// The support matrix for a package's interpreter clauses.
    pub fn support_matrix(&self, clauses: &[InterpreterClause]) -> SupportMatrix {
        SupportMatrix::build(self.baseline_python(), clauses)
    }

    /// The oldest interpreter a recipe has to care about.
    pub fn oldest_python(&self) -> Option<PyVer> {
        if self.strict_conda_forge {
            self.conda_forge_python.first().copied()
        } else {
            self.supported_python
                .iter()
                .copied()
                .find(|version| version.major >= 3)
        }
    }
}

/// Find the configuration file by walking up from `start_dir`.
///
/// Resolution order:
/// 1. `RAYSKULL_CONFIG` environment variable (explicit path)
/// 2. Walk up from `start_dir` looking for `rayskull.toml`, up to
///    `RAYSKULL_MAX_DEPTH` parent directories (default: 3).
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    if let Ok(explicit) = env::var("RAYSKULL_CONFIG") {
        let path = PathBuf::from(&explicit);
        if path.is_file() {
            return Ok(Some(path));
        }
        bail!("RAYSKULL_CONFIG is set to '{explicit}' but the file does not exist");
    }

    let max_depth = env::var("RAYSKULL_MAX_DEPTH")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_DEPTH);

    let mut current = start_dir.to_path_buf();
    for _ in 0..=max_depth {
        let candidate = current.join(CONFIG_NAME);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        if !current.pop() {
            break;
        }
    }

    Ok(None)
}
