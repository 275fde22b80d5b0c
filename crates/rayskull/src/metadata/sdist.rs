//! Metadata recovered from a source distribution by the build backend.
//!
//! This is the JSON shape the backend collaborator writes after running the
//! project's `setup()`: requirements, entry points, packages and compilers.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::metadata::MetadataError;

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SdistMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub install_requires: Vec<String>,
    pub setup_requires: Vec<String>,
    pub extras_require: BTreeMap<String, Vec<String>>,
    pub python_requires: Option<String>,
    pub entry_points: EntryPoints,
    pub packages: Vec<String>,
    /// Compilers detected from extension modules: `c`, `cxx`, `fortran`.
    pub compilers: Vec<String>,
}

/// `entry_points` is either a list of scripts or setuptools' group table.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EntryPoints {
    Scripts(Vec<String>),
    Groups(BTreeMap<String, OneOrMany>),
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self::Scripts(Vec::new())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl EntryPoints {
    /// Console and GUI scripts as `name = module:function` lines.
    pub fn scripts(&self) -> Vec<String> {
        match self {
            Self::Scripts(scripts) => scripts.clone(),
            Self::Groups(groups) => ["console_scripts", "gui_scripts"]
                .iter()
                .filter_map(|group| groups.get(*group))
                .flat_map(|entries| match entries {
                    OneOrMany::One(entry) => entry
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>(),
                    OneOrMany::Many(entries) => entries.clone(),
                })
                .collect(),
        }
    }
}

impl SdistMetadata {
    pub fn from_json(content: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Requirements only needed to run the test suite.
    pub fn test_requires(&self) -> Vec<String> {
        ["testing", "tests", "test"]
            .iter()
            .filter_map(|extra| self.extras_require.get(*extra))
            .flatten()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_groups() {
        let metadata = SdistMetadata::from_json(
            r#"{
                "install_requires": ["click>=7"],
                "entry_points": {
                    "console_scripts": ["black = black:patched_main"],
                    "gui_scripts": "blackd = blackd:main\n",
                    "pytest11": ["plugin = x"]
                },
                "extras_require": {"testing": ["pytest"]}
            }"#,
        )
        .unwrap();
        assert_eq!(
            metadata.entry_points.scripts(),
            ["black = black:patched_main", "blackd = blackd:main"]
        );
        assert_eq!(metadata.test_requires(), ["pytest"]);
        assert_eq!(metadata.name, None);
    }

    #[test]
    fn entry_point_list() {
        let metadata =
            SdistMetadata::from_json(r#"{"entry_points": ["tool = tool.cli:main"], "compilers": ["c"]}"#)
                .unwrap();
        assert_eq!(metadata.entry_points.scripts(), ["tool = tool.cli:main"]);
        assert_eq!(metadata.compilers, ["c"]);
    }
}
