//! The PyPI JSON API (`https://pypi.org/pypi/<name>/json`).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::metadata::MetadataError;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PyPiInfo {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub home_page: Option<String>,
    pub docs_url: Option<String>,
    pub license: Option<String>,
    pub license_expression: Option<String>,
    pub classifiers: Option<Vec<String>>,
    pub requires_dist: Option<Vec<String>>,
    pub project_urls: Option<BTreeMap<String, String>>,
    pub requires_python: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PyPiRelease {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub packagetype: String,
    #[serde(default)]
    pub digests: BTreeMap<String, String>,
}

/// A release as served by the JSON API.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PyPiMetadata {
    pub info: PyPiInfo,
    #[serde(default)]
    pub urls: Vec<PyPiRelease>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PyPiDocument {
    Response(PyPiMetadata),
    Info(PyPiInfo),
}

impl PyPiMetadata {
    /// Parse either a full API response or a bare `info` object.
    pub fn from_json(content: &str) -> Result<Self, MetadataError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("name").is_none() && value.get("info").is_none() {
            return Err(MetadataError::MissingField("info".to_string()));
        }
        Ok(match serde_json::from_value(value)? {
            PyPiDocument::Response(metadata) => metadata,
            PyPiDocument::Info(info) => Self {
                info,
                urls: Vec::new(),
            },
        })
    }

    /// The source distribution of this release, if one was uploaded.
    pub fn sdist(&self) -> Option<&PyPiRelease> {
        self.urls
            .iter()
            .find(|release| release.packagetype == "sdist")
    }
}

impl PyPiInfo {
    /// The project home page: `home_page`, else a `Homepage` project URL.
    pub fn home(&self) -> Option<&str> {
        non_empty(self.home_page.as_deref()).or_else(|| self.project_url(&["Homepage", "Home"]))
    }

    pub fn dev_url(&self) -> Option<&str> {
        self.project_url(&["Source", "Source Code", "Repository", "Code"])
    }

    pub fn doc_url(&self) -> Option<&str> {
        non_empty(self.docs_url.as_deref()).or_else(|| self.project_url(&["Documentation", "Docs"]))
    }

    fn project_url(&self, keys: &[&str]) -> Option<&str> {
        let urls = self.project_urls.as_ref()?;
        keys.iter().find_map(|key| {
            urls.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, url)| url.as_str())
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// A license mapped to SPDX, with a warning when the mapping is a guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLicense {
    pub spdx: String,
    pub warning: Option<String>,
}

/// Find the SPDX license of a release.
///
/// Checks, in order:
/// 1. `license_expression` (PEP 639), already SPDX
/// 2. the free-text `license` field, when it is a short identifier
/// 3. `License :: OSI Approved :: ...` classifiers
pub fn extract_license(info: &PyPiInfo) -> Option<ExtractedLicense> {
    if let Some(expression) = non_empty(info.license_expression.as_deref()) {
        return Some(ExtractedLicense {
            spdx: expression.to_string(),
            warning: None,
        });
    }

    if let Some(license) = non_empty(info.license.as_deref()) {
        if license.len() < 100 && !license.contains('\n') {
            return Some(match legacy_license_to_spdx(license) {
                Some(spdx) => ExtractedLicense {
                    spdx: spdx.to_string(),
                    warning: None,
                },
                None => ExtractedLicense {
                    spdx: license.to_string(),
                    warning: Some(format!(
                        "The license `{license}` is not a known SPDX identifier, please verify it"
                    )),
                },
            });
        }
    }

    let classifiers: Vec<&str> = info
        .classifiers
        .iter()
        .flatten()
        .filter_map(|classifier| classifier.strip_prefix("License :: OSI Approved :: "))
        .filter_map(classifier_to_spdx)
        .collect();
    if classifiers.is_empty() {
        return None;
    }
    Some(ExtractedLicense {
        spdx: classifiers.join(" OR "),
        warning: None,
    })
}

fn classifier_to_spdx(classifier: &str) -> Option<&'static str> {
    static MAP: &[(&str, &str)] = &[
        ("Apache Software License", "Apache-2.0"),
        ("BSD License", "BSD-3-Clause"),
        ("GNU General Public License v2 (GPLv2)", "GPL-2.0-only"),
        ("GNU General Public License v3 (GPLv3)", "GPL-3.0-only"),
        ("GNU Lesser General Public License v3 (LGPLv3)", "LGPL-3.0-only"),
        ("ISC License (ISCL)", "ISC"),
        ("MIT License", "MIT"),
        ("Mozilla Public License 2.0 (MPL 2.0)", "MPL-2.0"),
        ("Python Software Foundation License", "PSF-2.0"),
        ("The Unlicense (Unlicense)", "Unlicense"),
    ];
    MAP.iter()
        .find(|(name, _)| *name == classifier)
        .map(|(_, spdx)| *spdx)
}

fn legacy_license_to_spdx(license: &str) -> Option<&'static str> {
    static MAP: &[(&str, &str)] = &[
        ("MIT", "MIT"),
        ("MIT License", "MIT"),
        ("BSD", "BSD-3-Clause"),
        ("BSD License", "BSD-3-Clause"),
        ("BSD-3-Clause", "BSD-3-Clause"),
        ("BSD-2-Clause", "BSD-2-Clause"),
        ("Apache 2.0", "Apache-2.0"),
        ("Apache-2.0", "Apache-2.0"),
        ("Apache License 2.0", "Apache-2.0"),
        ("Apache Software License", "Apache-2.0"),
        ("GPLv2", "GPL-2.0-only"),
        ("GPLv3", "GPL-3.0-only"),
        ("LGPLv3", "LGPL-3.0-only"),
        ("ISC", "ISC"),
        ("MPL-2.0", "MPL-2.0"),
        ("PSF", "PSF-2.0"),
        ("Unlicense", "Unlicense"),
    ];
    MAP.iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(license))
        .map(|(_, spdx)| *spdx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> PyPiInfo {
        PyPiMetadata::from_json(json).unwrap().info
    }

    #[test]
    fn full_response_and_bare_info() {
        let metadata = PyPiMetadata::from_json(
            r#"{
                "info": {"name": "click", "version": "8.1.7"},
                "urls": [
                    {"filename": "click-8.1.7-py3-none-any.whl", "url": "https://x/click.whl", "packagetype": "bdist_wheel"},
                    {"filename": "click-8.1.7.tar.gz", "url": "https://x/click.tar.gz", "packagetype": "sdist", "digests": {"sha256": "abc"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(metadata.info.name, "click");
        assert_eq!(metadata.sdist().unwrap().digests["sha256"], "abc");

        let metadata = PyPiMetadata::from_json(r#"{"name": "click", "version": "8.1.7"}"#).unwrap();
        assert!(metadata.sdist().is_none());
    }

    #[test]
    fn missing_info_is_reported() {
        let err = PyPiMetadata::from_json(r#"{"releases": {}}"#).unwrap_err();
        assert!(matches!(err, MetadataError::MissingField(field) if field == "info"));
    }

    #[test]
    fn urls_fall_back_to_project_urls() {
        let info = info(
            r#"{"name": "a", "version": "1", "home_page": "",
                "project_urls": {"homepage": "https://a.dev", "Source": "https://github.com/a/a"}}"#,
        );
        assert_eq!(info.home(), Some("https://a.dev"));
        assert_eq!(info.dev_url(), Some("https://github.com/a/a"));
        assert_eq!(info.doc_url(), None);
    }

    #[test]
    fn license_prefers_expression() {
        let info = info(
            r#"{"name": "a", "version": "1", "license_expression": "MIT OR Apache-2.0", "license": "BSD"}"#,
        );
        assert_eq!(extract_license(&info).unwrap().spdx, "MIT OR Apache-2.0");
    }

    #[test]
    fn license_from_legacy_field_and_classifiers() {
        let legacy = info(r#"{"name": "a", "version": "1", "license": "mit"}"#);
        assert_eq!(extract_license(&legacy).unwrap().spdx, "MIT");

        let unknown = info(r#"{"name": "a", "version": "1", "license": "Custom"}"#);
        assert!(extract_license(&unknown).unwrap().warning.is_some());

        let classifiers = info(
            r#"{"name": "a", "version": "1", "classifiers": [
                "License :: OSI Approved :: MIT License",
                "License :: OSI Approved :: Apache Software License",
                "Programming Language :: Python"]}"#,
        );
        assert_eq!(extract_license(&classifiers).unwrap().spdx, "MIT OR Apache-2.0");
    }
}
