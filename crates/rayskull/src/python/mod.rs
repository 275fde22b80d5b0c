//! Python interpreter versions and the selector algebra built on them.
//!
//! ## Architecture
//!
//! - [`matrix`]: which configured interpreters a `requires_python` admits
//! - [`selector`]: turns a [`SupportMatrix`] into a `# [py...]` selector or a
//!   `python` version limit
//! - [`specifier`]: Poetry-style python/platform specifiers to selectors

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::version::VersionError;

pub mod matrix;
pub mod selector;
pub mod specifier;

pub use matrix::SupportMatrix;
pub use selector::{RenderMode, render, py_version_to_limit_python, py_version_to_selector};

/// An interpreter version, ordered by major then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PyVer {
    pub major: u32,
    pub minor: u32,
}

impl PyVer {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The digits used in selectors: `38`, `310`, and `401` for 4.1.
    pub fn selector_digits(self) -> String {
        if self.major >= 4 {
            format!("{}{:02}", self.major, self.minor)
        } else {
            format!("{}{}", self.major, self.minor)
        }
    }
}

impl fmt::Display for PyVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PyVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(s.to_string());
        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl<'de> Deserialize<'de> for PyVer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Comparison operators understood when filtering interpreters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl Comparison {
    /// `=` and `===` are read as `==`. `~=` is read as `>=`, which is only an
    /// approximation of compatible release but is all interpreter filtering
    /// needs.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "==" | "=" | "===" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">" => Some(Self::Greater),
            ">=" | "~=" => Some(Self::GreaterEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEqual),
            _ => None,
        }
    }

    /// Evaluate `lhs <op> rhs`.
    pub fn evaluate(self, lhs: PyVer, rhs: PyVer) -> bool {
        match self {
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterEqual => lhs >= rhs,
            Self::Less => lhs < rhs,
            Self::LessEqual => lhs <= rhs,
        }
    }
}

/// One `(op, major, minor)` clause of a `requires_python` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterClause {
    pub comparison: Comparison,
    pub version: PyVer,
}

static REQUIRES_PYTHON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([~><=!]+)\s*(\d+)(?:\.(\d+))?").unwrap());

/// Extract the interpreter clauses of a `requires_python` expression.
///
/// Patch components and wildcards are ignored (`!=3.0.*` is `!=3.0`).
pub fn parse_requires_python(expr: &str) -> Vec<InterpreterClause> {
    REQUIRES_PYTHON
        .captures_iter(expr)
        .filter_map(|captures| {
            let token = &captures[1];
            let Some(comparison) = Comparison::from_token(token) else {
                tracing::debug!("Ignoring unknown operator `{token}` in `{expr}`");
                return None;
            };
            let major = captures[2].parse().ok()?;
            let minor = captures
                .get(3)
                .map_or(Some(0), |m| m.as_str().parse().ok())?;
            Some(InterpreterClause {
                comparison,
                version: PyVer::new(major, minor),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_digits() {
        assert_eq!(PyVer::new(3, 8).selector_digits(), "38");
        assert_eq!(PyVer::new(3, 10).selector_digits(), "310");
        assert_eq!(PyVer::new(4, 1).selector_digits(), "401");
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(PyVer::new(3, 9) < PyVer::new(3, 10));
        assert!(PyVer::new(2, 7) < PyVer::new(3, 0));
    }

    #[test]
    fn parse_clauses() {
        let clauses = parse_requires_python(">=2.7, !=3.0.*, <4, ~=3.6");
        assert_eq!(
            clauses,
            [
                InterpreterClause {
                    comparison: Comparison::GreaterEqual,
                    version: PyVer::new(2, 7)
                },
                InterpreterClause {
                    comparison: Comparison::NotEqual,
                    version: PyVer::new(3, 0)
                },
                InterpreterClause {
                    comparison: Comparison::Less,
                    version: PyVer::new(4, 0)
                },
                InterpreterClause {
                    comparison: Comparison::GreaterEqual,
                    version: PyVer::new(3, 6)
                },
            ]
        );
    }

    #[test]
    fn parse_pyver() {
        assert_eq!("3.12".parse::<PyVer>().unwrap(), PyVer::new(3, 12));
        assert_eq!("3".parse::<PyVer>().unwrap(), PyVer::new(3, 0));
        assert!("three".parse::<PyVer>().is_err());
    }
}
