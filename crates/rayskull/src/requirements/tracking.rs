//! Per-package adjustments for conda-forge.
//!
//! Some PyPI projects are published on conda-forge under another name, import
//! a module with a different name, or need their version bounds clamped. The
//! table lives in `tracking.toml` and is compiled into the binary.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::requirements::Requirement;

static TRACKED: LazyLock<BTreeMap<String, TrackedPackage>> = LazyLock::new(|| {
    toml::from_str(include_str!("tracking.toml")).expect("the package tracking table is valid TOML")
});

static DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([!=><]+)\s*([a-z0-9\-\._]+)").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TrackedPackage {
    pub conda_forge: Option<String>,
    pub import_name: Option<String>,
    pub delimiter_min: Option<String>,
    pub delimiter_max: Option<String>,
    #[serde(default)]
    pub avoid_selector: bool,
}

/// The tracking entry for a PyPI name, empty when the package is not tracked.
pub fn track_package(name: &str) -> TrackedPackage {
    TRACKED.get(name).cloned().unwrap_or_default()
}

/// The conda-forge name of a PyPI package.
pub fn conda_name(name: &str) -> String {
    TRACKED
        .get(name)
        .and_then(|package| package.conda_forge.clone())
        .unwrap_or_else(|| name.to_string())
}

/// The module a package is imported as.
pub fn import_name(name: &str) -> String {
    TRACKED
        .get(name)
        .and_then(|package| package.import_name.clone())
        .unwrap_or_else(|| name.replace('-', "_"))
}

/// Clamp the bounds of `constraint` to the package's `[min, max)` window.
///
/// Lower bounds below `delimiter-min` are raised to `>=min`, upper bounds above
/// `delimiter-max` are lowered to `<max`. Exact pins, and anything that does
/// not compare numerically, are returned unchanged.
pub fn solve_version_delimiter(constraint: &str, package: &TrackedPackage) -> String {
    if package.delimiter_min.is_none() && package.delimiter_max.is_none() {
        return constraint.to_string();
    }
    let clauses: Vec<(&str, &str)> = DELIMITER
        .captures_iter(constraint)
        .filter_map(|captures| {
            Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
        })
        .collect();
    if clauses.is_empty() || clauses.iter().any(|(operator, _)| *operator == "==") {
        return constraint.to_string();
    }

    let mut solved = Vec::with_capacity(clauses.len());
    for (operator, version) in clauses {
        let clamped = if operator.contains('>') {
            package
                .delimiter_min
                .as_deref()
                .map(|min| compare(min, version).map(|ordering| (min, holds(operator, ordering))))
        } else if operator.contains('<') {
            package
                .delimiter_max
                .as_deref()
                .map(|max| compare(version, max).map(|ordering| (max, !holds(operator, ordering))))
        } else {
            None
        };

        match clamped {
            None => solved.push(format!("{operator}{version}")),
            Some(None) => {
                tracing::debug!("Cannot compare `{version}` numerically, keeping `{constraint}`");
                return constraint.to_string();
            }
            Some(Some((bound, true))) if operator.contains('>') => solved.push(format!(">={bound}")),
            Some(Some((bound, true))) => solved.push(format!("<{bound}")),
            Some(Some((_, false))) => solved.push(format!("{operator}{version}")),
        }
    }
    solved.join(",")
}

/// Rename a requirement, clamp its bounds and drop its guard as the tracking
/// table says.
pub fn apply_tracking(requirement: Requirement) -> Requirement {
    if requirement.is_symbolic() {
        return requirement;
    }
    let package = track_package(requirement.name());
    let constraint = solve_version_delimiter(requirement.constraint(), &package);
    let mut requirement = requirement.with_constraint(constraint);
    if let Some(name) = &package.conda_forge {
        requirement = requirement.with_name(name.clone());
    }
    if package.avoid_selector {
        requirement = requirement.with_guard(None);
    }
    requirement
}

fn holds(operator: &str, ordering: Ordering) -> bool {
    match operator {
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        "!=" => ordering != Ordering::Equal,
        _ => false,
    }
}

/// Compare dotted numeric versions, padding the shorter one with zeros.
fn compare(lhs: &str, rhs: &str) -> Option<Ordering> {
    let parse = |version: &str| -> Option<Vec<u64>> {
        version.split('.').map(|part| part.parse().ok()).collect()
    };
    let (lhs, rhs) = (parse(lhs)?, parse(rhs)?);
    let len = lhs.len().max(rhs.len());
    let padded = |release: &[u64]| -> Vec<u64> {
        let mut release = release.to_vec();
        release.resize(len, 0);
        release
    };
    Some(padded(&lhs).cmp(&padded(&rhs)))
}
