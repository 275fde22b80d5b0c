//! Version constraints.
//!
//! Every upstream dialect is translated into a [`ConstraintSet`]: an ordered
//! list of [`VersionClause`]s that are ANDed together. The dialect encoders
//! ([`poetry`], [`pep440`] and [`cran`]) rewrite shorthand into the
//! comma-separated PEP 440 style that [`ConstraintSet::parse`] accepts.
//!
//! Parsing is strict: a version token must be `major[.minor[.patch]]` with an
//! optional leading `v`. Anything else is reported as
//! [`VersionError::InvalidVersion`] together with the offending text.

use std::fmt;
use std::str::FromStr;

pub mod cran;
pub mod pep440;
pub mod poetry;

/// Errors raised while parsing or encoding version constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version `{0}`: expected `major[.minor[.patch]]`")]
    InvalidVersion(String),
    #[error("Unknown version operator `{operator}` in `{clause}`")]
    InvalidOperator { operator: String, clause: String },
    #[error("Missing version operator in `{0}`: a bare version is only allowed on its own")]
    MissingOperator(String),
    #[error("Compatible release `~={0}` needs at least two version components")]
    CompatibleReleaseTooShort(String),
}

/// A comparison operator in a [`VersionClause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    /// `~=`, PEP 440 compatible release.
    Compatible,
    /// `^`, Poetry caret.
    Caret,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::Compatible => "~=",
            Self::Caret => "^",
        }
    }

    /// Parse an operator token. `=` and `===` are accepted as spellings of `==`.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" | "=" | "===" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanEqual),
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanEqual),
            "~=" => Some(Self::Compatible),
            "^" => Some(Self::Caret),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted numeric version with one to three components.
///
/// The number of explicit components is remembered, since the caret and tilde
/// encoders depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    major: u64,
    minor: Option<u64>,
    patch: Option<u64>,
}

impl Version {
    pub fn new(major: u64, minor: Option<u64>, patch: Option<u64>) -> Self {
        Self {
            major,
            minor,
            // A patch without a minor cannot be written down.
            patch: minor.and(patch),
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    /// The minor component, `0` when it was not written.
    pub fn minor(&self) -> u64 {
        self.minor.unwrap_or(0)
    }

    /// The patch component, `0` when it was not written.
    pub fn patch(&self) -> u64 {
        self.patch.unwrap_or(0)
    }

    /// Number of components that were written explicitly.
    pub fn release_len(&self) -> usize {
        1 + usize::from(self.minor.is_some()) + usize::from(self.patch.is_some())
    }

    /// The explicit components, in order.
    pub fn release(&self) -> Vec<u64> {
        [Some(self.major), self.minor, self.patch]
            .into_iter()
            .flatten()
            .collect()
    }

    /// The version padded to `major.minor.patch`.
    pub fn to_padded_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor(), self.patch())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(raw.to_string());
        let text = raw.trim();
        let text = text
            .strip_prefix('v')
            .or_else(|| text.strip_prefix('V'))
            .unwrap_or(text);

        let mut components = Vec::with_capacity(3);
        for part in text.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            components.push(part.parse::<u64>().map_err(|_| invalid())?);
        }

        match components.as_slice() {
            [major] => Ok(Self::new(*major, None, None)),
            [major, minor] => Ok(Self::new(*major, Some(*minor), None)),
            [major, minor, patch] => Ok(Self::new(*major, Some(*minor), Some(*patch))),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

/// A single `(operator, version)` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionClause {
    operator: Operator,
    version: Version,
}

impl VersionClause {
    pub fn new(operator: Operator, version: Version) -> Self {
        Self { operator, version }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for VersionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// An ordered, ANDed list of clauses. Empty means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    clauses: Vec<VersionClause>,
}

impl ConstraintSet {
    /// Parse a comma-separated constraint expression such as `>=1.2, <2`.
    ///
    /// `""` and `"*"` parse to the empty set. A clause without an operator is
    /// only accepted when it is the whole expression, and means `==`.
    pub fn parse(expr: &str) -> Result<Self, VersionError> {
        let expr = expr.trim();
        if expr.is_empty() || expr == "*" {
            return Ok(Self::default());
        }

        let parts: Vec<&str> = expr
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        let mut clauses = Vec::with_capacity(parts.len());
        for part in &parts {
            let split = part
                .find(|c: char| !matches!(c, '=' | '!' | '<' | '>' | '~' | '^'))
                .unwrap_or(part.len());
            let (token, version) = part.split_at(split);

            let operator = if token.is_empty() {
                if parts.len() > 1 {
                    return Err(VersionError::MissingOperator((*part).to_string()));
                }
                Operator::Equal
            } else {
                Operator::from_token(token).ok_or_else(|| VersionError::InvalidOperator {
                    operator: token.to_string(),
                    clause: (*part).to_string(),
                })?
            };

            clauses.push(VersionClause::new(operator, version.trim().parse()?));
        }

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[VersionClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl FromStr for ConstraintSet {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, clause) in self.clauses.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Split a specifier such as `>=1.0, <2` into its clauses, keeping each
/// operator attached to the version that follows it.
pub fn split_clauses(spec: &str) -> Vec<String> {
    let mut result = Vec::new();
    for part in spec.split(',') {
        let mut operator = String::new();
        let mut rest = part.trim();
        while !rest.is_empty() {
            let split = rest
                .find(|c: char| !matches!(c, '>' | '<' | '!' | '=' | '~' | '^'))
                .unwrap_or(rest.len());
            if split > 0 {
                operator = rest[..split].trim().to_string();
                rest = rest[split..].trim_start();
                continue;
            }
            let end = rest
                .find(['>', '<', '!', '=', '~', '^'])
                .unwrap_or(rest.len());
            let value = rest[..end].trim();
            if !value.is_empty() {
                result.push(format!("{operator}{value}"));
            }
            rest = &rest[end..];
        }
    }
    result
}
