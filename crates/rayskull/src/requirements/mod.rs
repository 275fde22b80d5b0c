//! Recipe requirement lines.
//!
//! A [`Requirement`] is one line of a `requirements` section:
//! `name constraint  # [guard]`. Requirements are only built through the
//! validating constructors ([`Requirement::from_str`],
//! [`Requirement::from_record`] and [`Requirement::from_requires_dist`]),
//! so names are always lowercase and constraints are always conda-ready.
//!
//! Symbolic entries such as `{{ compiler('c') }}` are carried verbatim.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::marker;
use crate::metadata::MetadataError;
use crate::python::{Comparison, PyVer};
use crate::version::pep440::expand_compatible_release;
use crate::version::poetry::encode_poetry_version;
use crate::version::{ConstraintSet, VersionError};

pub mod merge;
pub mod registry;
pub mod tracking;

pub use crate::version::split_clauses as split_deps;
pub use merge::{MergeOutcome, apply_pin_compatible, merge, merge_records};
pub use registry::{CachedRegistry, NameRegistry, NoopRegistry, StaticRegistry};

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([\.a-zA-Z0-9_-]+)\s*(.*?)\s*$").unwrap());

static GUARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*#\s*\[(.*)\]\s*$").unwrap());

static PURL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:virtual|pkg):").unwrap());

/// Versions that mean "anything" and are dropped from the constraint.
const WILDCARDS: [&str; 6] = ["*", "=*", "==*", "*.*", "*.*.*", ""];

/// Expand Poetry shorthand, `|` alternatives and `~=` into a conda constraint.
fn expand_record_constraint(raw: &str) -> Result<String, VersionError> {
    let encoded = encode_poetry_version(raw)?;
    let mut alternatives = Vec::new();
    for alternative in encoded.split('|') {
        let set = ConstraintSet::parse(alternative)?;
        if !set.is_empty() {
            alternatives.push(expand_compatible_release(&set.to_string())?);
        }
    }
    Ok(alternatives.join("|"))
}

/// A single entry of a requirements section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Lowercase package name, or the whole template expression for a
    /// symbolic entry.
    name: String,
    /// Conda constraint, empty when unconstrained.
    constraint: String,
    guard: Option<String>,
}

impl Requirement {
    /// A template expression such as `{{ compiler('c') }}`.
    pub fn symbolic(expression: impl Into<String>, guard: Option<String>) -> Self {
        Self {
            name: expression.into(),
            constraint: String::new(),
            guard,
        }
    }

    /// Build a requirement from a structured record.
    ///
    /// The raw constraint may use Poetry shorthand, `|` alternatives and `~=`;
    /// every alternative is validated before it is expanded.
    pub fn from_record(record: &RequirementRecord) -> Result<Self, MetadataError> {
        let name = record.name.trim();
        if !is_package_name(name) {
            return Err(MetadataError::InvalidRecord(format!(
                "`{}` is not a package name",
                record.name
            )));
        }

        let constraint =
            expand_record_constraint(&record.raw_constraint_expression).map_err(|source| {
                MetadataError::InvalidConstraint {
                    name: name.to_string(),
                    raw: record.raw_constraint_expression.clone(),
                    source,
                }
            })?;

        let guard = record
            .environment_marker_expression
            .as_deref()
            .and_then(|expression| marker::translate(expression).guard);

        Ok(Self {
            name: name.to_lowercase(),
            constraint,
            guard,
        })
    }

    /// Parse a PEP 508 `Requires-Dist` line such as
    /// `requests (>=2.0) ; python_version < "3.8"`.
    ///
    /// Returns `None` for requirements that only apply to extras or tests.
    pub fn from_requires_dist(line: &str) -> Result<Option<DistRequirement>, MetadataError> {
        let (requirement, environment) = match line.split_once(';') {
            Some((requirement, environment)) => (requirement, Some(environment)),
            None => (line, None),
        };

        let translated = environment.map(marker::translate).unwrap_or_default();
        if translated.skip {
            return Ok(None);
        }

        let mut parsed: Self = requirement.parse()?;
        if translated.guard.is_some() {
            parsed.guard = translated.guard;
        }
        Ok(Some(DistRequirement {
            requirement: parsed,
            needs_arch: translated.needs_arch,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn is_symbolic(&self) -> bool {
        is_symbolic(&self.name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    pub fn with_guard(mut self, guard: Option<String>) -> Self {
        self.guard = guard;
        self
    }

    /// The line without its guard: `name constraint`.
    pub fn spec(&self) -> String {
        if self.constraint.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.constraint)
        }
    }
}

impl FromStr for Requirement {
    type Err = MetadataError;

    /// Parse a recipe line: `name [extras] (constraint)  # [guard]`.
    ///
    /// Extras and parentheses are dropped, spaces after operators are
    /// removed and `~=` is expanded. Plain comments are discarded.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (body, guard) = match GUARD.captures(line) {
            Some(captures) => {
                let start = captures.get(0).map_or(line.len(), |m| m.start());
                (&line[..start], Some(captures[1].trim().to_string()))
            }
            None => (line.split_once(" #").map_or(line, |(body, _)| body), None),
        };
        let body = body.trim();

        if is_symbolic(body) {
            return Ok(Self::symbolic(body, guard));
        }

        let captures = NAME
            .captures(body)
            .ok_or_else(|| MetadataError::InvalidRecord(format!("`{line}` is not a requirement")))?;
        let name = captures[1].to_lowercase();
        let mut rest = captures[2].trim();
        if rest.starts_with('[') {
            rest = rest.split_once(']').map_or("", |(_, rest)| rest);
        }

        let constraint: String = rest
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
            .collect();
        let constraint = if WILDCARDS.contains(&constraint.as_str()) {
            String::new()
        } else {
            expand_compatible_release(&constraint)?
        };

        Ok(Self {
            name,
            constraint,
            guard,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec())?;
        if let Some(guard) = &self.guard {
            write!(f, "  # [{guard}]")?;
        }
        Ok(())
    }
}

/// A parsed `Requires-Dist` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistRequirement {
    pub requirement: Requirement,
    /// A marker was translated into a guard, so the recipe cannot be noarch.
    pub needs_arch: bool,
}

/// Where a requirement record came from. Earlier sources win when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePriority {
    PrimaryIndex,
    BuildBackend,
    ProjectManifest,
}

/// A requirement as reported by a metadata collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub name: String,
    #[serde(default)]
    pub raw_constraint_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_marker_expression: Option<String>,
    pub source_priority: SourcePriority,
}

impl RequirementRecord {
    /// Whether the marker restricts this record to an extra or to tests.
    pub fn is_skipped(&self) -> bool {
        self.environment_marker_expression
            .as_deref()
            .is_some_and(|expression| marker::translate(expression).skip)
    }
}

/// The four requirement sections of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSections {
    pub build: Vec<Requirement>,
    pub host: Vec<Requirement>,
    pub run: Vec<Requirement>,
    pub run_constrained: Vec<Requirement>,
}

impl RequirementSections {
    /// Sections in recipe order, with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Requirement])> {
        [
            ("build", self.build.as_slice()),
            ("host", self.host.as_slice()),
            ("run", self.run.as_slice()),
            ("run_constrained", self.run_constrained.as_slice()),
        ]
        .into_iter()
    }
}

fn is_symbolic(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with("{{") || text.starts_with("<{")
}

fn is_package_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Clean up raw dependency lines for a recipe.
///
/// Extras, parentheses, spaces after operators and plain comments are
/// removed, guards are kept, and the package itself (`self_name`) is dropped.
/// PEP 725 PURLs are passed through.
pub fn format_dependencies(deps: &[String], self_name: &str) -> Vec<String> {
    static OPERATOR_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([<>!=~]+)\s+").unwrap());
    static EXTRAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[[^\]]*\]").unwrap());
    static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+#.*").unwrap());

    let own = self_name.replace('-', "_").to_lowercase();
    let mut formatted = Vec::with_capacity(deps.len());
    for dep in deps {
        if PURL.is_match(dep) {
            formatted.push(dep.trim().to_string());
            continue;
        }
        let Some(captures) = NAME.captures(dep) else {
            continue;
        };
        if captures[1].replace('-', "_").to_lowercase() == own {
            continue;
        }

        let line = OPERATOR_SPACE.replace_all(dep.trim(), "$1");
        if GUARD.is_match(&line) {
            formatted.push(line.into_owned());
            continue;
        }
        let line = EXTRAS.replace_all(&line, " ");
        let line = COMMENT.replace(&line, "");
        let line: String = line.chars().filter(|c| *c != '(' && *c != ')').collect();
        formatted.push(line.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    formatted
}

/// Rewrite `~=` clauses of a requirement line into explicit ranges, keeping
/// any guard: `pytest ~=5.3.2` becomes `pytest >=5.3.2,<5.4.dev0`.
pub fn ensure_pep440(line: &str) -> Result<String, VersionError> {
    let trimmed = line.trim();
    if is_symbolic(trimmed) {
        return Ok(line.to_string());
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() <= 1 {
        return Ok(line.to_string());
    }

    let (tokens, selector) = match tokens.iter().position(|token| token.starts_with('#')) {
        Some(index) => (&tokens[..index], format!("  {}", tokens[index..].join(" "))),
        None => (tokens.as_slice(), String::new()),
    };
    let Some((name, constraint)) = tokens.split_first() else {
        return Ok(line.to_string());
    };
    let constraint = split_deps(&constraint.concat()).join(",");
    Ok(format!(
        "{name} {}{selector}",
        expand_compatible_release(&constraint)?
    ))
}

/// Drop or simplify requirements whose single `py<op>NN` guard is decided by
/// the oldest supported interpreter.
///
/// A guard that can never be true for `py_min` or anything newer removes the
/// line. A guard that is always true is stripped.
pub fn clean_deps_for_conda_forge(deps: Vec<Requirement>, py_min: PyVer) -> Vec<Requirement> {
    static PY_GUARD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^py\s*([<>=!]+)?\s*(\d+)$").unwrap());

    let mut cleaned = Vec::with_capacity(deps.len());
    for dep in deps {
        let Some(captures) = dep.guard().and_then(|guard| PY_GUARD.captures(guard.trim())) else {
            cleaned.push(dep);
            continue;
        };
        let operator = captures.get(1).map_or("==", |m| m.as_str());
        let Some(comparison) = Comparison::from_token(operator) else {
            cleaned.push(dep);
            continue;
        };
        let Some(version) = selector_version(&captures[2]) else {
            cleaned.push(dep);
            continue;
        };

        let (never, always) = match comparison {
            Comparison::Less => (version <= py_min, false),
            Comparison::LessEqual | Comparison::Equal => (version < py_min, false),
            Comparison::Greater => (false, py_min > version),
            Comparison::GreaterEqual => (false, py_min >= version),
            Comparison::NotEqual => (false, version < py_min),
        };
        tracing::debug!("Guard on `{dep}` against {py_min}: never={never}, always={always}");
        if never {
            continue;
        }
        if always {
            cleaned.push(dep.with_guard(None));
        } else {
            cleaned.push(dep);
        }
    }
    cleaned
}

/// `38` is 3.8, `310` is 3.10, `3` is 3.0.
fn selector_version(digits: &str) -> Option<PyVer> {
    let (major, minor) = digits.split_at(1);
    Some(PyVer::new(
        major.parse().ok()?,
        if minor.is_empty() { 0 } else { minor.parse().ok()? },
    ))
}
