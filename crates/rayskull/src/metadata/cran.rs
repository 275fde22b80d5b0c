//! R package `DESCRIPTION` files.
//!
//! A DESCRIPTION is a list of `Key: value` fields. A line that starts with
//! whitespace continues the previous field.

use indexmap::IndexMap;

use crate::metadata::MetadataError;
use crate::version::cran::{CranDependency, parse_dependency_field};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    fields: IndexMap<String, String>,
    lines: Vec<String>,
}

impl Description {
    pub fn parse(content: &str) -> Result<Self, MetadataError> {
        let mut fields: IndexMap<String, String> = IndexMap::new();
        let mut lines: Vec<String> = Vec::new();
        let mut last: Option<String> = None;

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with([' ', '\t']) {
                let Some(key) = &last else {
                    return Err(MetadataError::InvalidRecord(format!(
                        "continuation line without a field: `{}`",
                        line.trim()
                    )));
                };
                if let Some(value) = fields.get_mut(key) {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                if let Some(previous) = lines.last_mut() {
                    previous.push(' ');
                    previous.push_str(line.trim());
                }
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(MetadataError::InvalidRecord(format!(
                    "could not parse DESCRIPTION line `{line}`"
                )));
            };
            let key = key.trim().to_string();
            fields.insert(key.clone(), value.trim().to_string());
            lines.push(line.trim_end().to_string());
            last = Some(key);
        }

        if !fields.contains_key("Package") {
            return Err(MetadataError::MissingField("Package".to_string()));
        }
        Ok(Self { fields, lines })
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn package(&self) -> &str {
        self.get("Package").unwrap_or_default()
    }

    pub fn version(&self) -> Option<&str> {
        self.get("Version")
    }

    pub fn title(&self) -> Option<&str> {
        self.get("Title")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("Description")
    }

    pub fn license(&self) -> Option<&str> {
        self.get("License")
    }

    /// The first entry of the comma-separated `URL` field.
    pub fn url(&self) -> Option<&str> {
        self.get("URL")
            .and_then(|urls| urls.split([',', ' ']).map(str::trim).find(|url| !url.is_empty()))
    }

    pub fn bug_reports(&self) -> Option<&str> {
        self.get("BugReports")
    }

    pub fn imports(&self) -> Result<Vec<CranDependency>, MetadataError> {
        self.dependencies("Imports")
    }

    pub fn depends(&self) -> Result<Vec<CranDependency>, MetadataError> {
        self.dependencies("Depends")
    }

    pub fn linking_to(&self) -> Result<Vec<CranDependency>, MetadataError> {
        self.dependencies("LinkingTo")
    }

    pub fn needs_compilation(&self) -> bool {
        self.get("NeedsCompilation")
            .is_some_and(|value| value.eq_ignore_ascii_case("yes"))
    }

    /// The fields as read, with continuations joined onto one line.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn dependencies(&self, field: &str) -> Result<Vec<CranDependency>, MetadataError> {
        Ok(self
            .get(field)
            .map(parse_dependency_field)
            .transpose()?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A3: &str = "\
Package: A3
Version: 0.9.2
Title: Accurate, Adaptable, and Accessible Error Metrics for Predictive Models
Depends: R (>= 2.15.0), xtable, pbapply
Suggests: randomForest, e1071
Imports: MASS, R.methodsS3 (>= 1.5.2), R.oo (>= 1.15.8), R.utils (>=
        1.27.1), matrixStats (>= 0.8.12)
License: GPL (>= 2)
URL: https://example.org/a3, https://github.com/x/a3
NeedsCompilation: no
";

    #[test]
    fn continuation_lines_are_joined() {
        let description = Description::parse(A3).unwrap();
        assert_eq!(description.package(), "A3");
        assert_eq!(description.version(), Some("0.9.2"));
        assert_eq!(description.url(), Some("https://example.org/a3"));
        assert!(!description.needs_compilation());
        assert_eq!(
            description.lines()[5],
            "Imports: MASS, R.methodsS3 (>= 1.5.2), R.oo (>= 1.15.8), R.utils (>= 1.27.1), matrixStats (>= 0.8.12)"
        );

        let imports: Vec<String> = description
            .imports()
            .unwrap()
            .iter()
            .map(CranDependency::to_requirement_line)
            .collect();
        assert_eq!(
            imports,
            [
                "r-mass",
                "r-r.methodss3 >=1.5.2",
                "r-r.oo >=1.15.8",
                "r-r.utils >=1.27.1",
                "r-matrixstats >=0.8.12"
            ]
        );

        let depends = description.depends().unwrap();
        assert!(depends[0].is_r());
        assert_eq!(depends[0].to_requirement_line(), "r-base >=2.15.0");
        assert!(description.linking_to().unwrap().is_empty());
    }

    #[test]
    fn missing_package_is_reported() {
        let err = Description::parse("Version: 1.0\n").unwrap_err();
        assert!(matches!(err, MetadataError::MissingField(field) if field == "Package"));
    }

    #[test]
    fn stray_continuation_is_rejected() {
        let err = Description::parse("   orphan\nPackage: x\n").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidRecord(_)));
    }

    #[test]
    fn compilation_flag() {
        let description = Description::parse("Package: rcpp\nNeedsCompilation: yes\n").unwrap();
        assert!(description.needs_compilation());
        assert_eq!(description.title(), None);
    }
}
