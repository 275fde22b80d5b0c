//! CRAN dependency fields (`Imports`, `Depends`, `LinkingTo`).
//!
//! Entries look like `pkg (>= 1.2-3)`. CRAN versions use `-` as a component
//! separator, which conda does not accept, so it is rewritten to `_`.

use crate::version::VersionError;

/// One entry of a CRAN dependency field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CranDependency {
    pub name: String,
    /// conda-style constraint, empty when unconstrained.
    pub constraint: String,
}

impl CranDependency {
    /// The conda package name: `R` is `r-base`, everything else `r-<lower>`.
    pub fn conda_name(&self) -> String {
        if self.name == "R" {
            "r-base".to_string()
        } else {
            format!("r-{}", self.name.to_lowercase())
        }
    }

    pub fn is_r(&self) -> bool {
        self.name == "R"
    }

    /// `<conda-name> <constraint>`, or the bare name.
    pub fn to_requirement_line(&self) -> String {
        if self.constraint.is_empty() {
            self.conda_name()
        } else {
            format!("{} {}", self.conda_name(), self.constraint)
        }
    }
}

/// Parse a comma-separated CRAN dependency field.
pub fn parse_dependency_field(field: &str) -> Result<Vec<CranDependency>, VersionError> {
    let mut dependencies = Vec::new();
    for entry in field.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, constraint) = match entry.split_once('(') {
            Some((name, rest)) => (name.trim(), encode_cran_constraint(rest.trim_end_matches(')'))?),
            None => (entry, String::new()),
        };
        dependencies.push(CranDependency {
            name: name.to_string(),
            constraint,
        });
    }
    Ok(dependencies)
}

/// Encode a CRAN constraint such as `>= 1.2-3` as `>=1.2_3`.
///
/// A bare version means an exact match.
pub fn encode_cran_constraint(raw: &str) -> Result<String, VersionError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(String::new());
    }

    let split = compact
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(compact.len());
    let (operator, version) = compact.split_at(split);

    let valid = !version.is_empty()
        && version
            .split(['.', '-'])
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if !valid {
        return Err(VersionError::InvalidVersion(version.to_string()));
    }

    let operator = match operator {
        "" | "=" => "==",
        other => other,
    };
    Ok(format!("{operator}{}", version.replace('-', "_")))
}
