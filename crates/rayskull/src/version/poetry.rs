//! Poetry caret (`^`) and tilde (`~`) shorthand.

use crate::version::{Version, VersionError};

/// The exclusive ceiling of a caret requirement.
///
/// Bumps the major version when it is non-zero (or the only component).
/// Otherwise bumps the minor when it is non-zero (or the last component),
/// and falls back to the patch.
pub fn get_caret_ceiling(target: &str) -> Result<String, VersionError> {
    let version: Version = target.parse()?;
    Ok(caret_ceiling(&version))
}

/// The exclusive ceiling of a tilde requirement: the next minor when a minor
/// was given, otherwise the next major.
pub fn get_tilde_ceiling(target: &str) -> Result<String, VersionError> {
    let version: Version = target.parse()?;
    Ok(tilde_ceiling(&version))
}

fn caret_ceiling(version: &Version) -> String {
    if version.major() > 0 || version.release_len() == 1 {
        format!("{}.0.0", version.major() + 1)
    } else if version.minor() > 0 || version.release_len() == 2 {
        format!("0.{}.0", version.minor() + 1)
    } else {
        format!("0.0.{}", version.patch() + 1)
    }
}

fn tilde_ceiling(version: &Version) -> String {
    if version.release_len() >= 2 {
        format!("{}.{}.0", version.major(), version.minor() + 1)
    } else {
        format!("{}.0.0", version.major() + 1)
    }
}

/// Encode a Poetry version requirement as a conda version specifier.
///
/// `^` and `~` clauses become a `>=floor,<ceiling` pair; every other clause
/// (including `~=`) is passed through with its spaces removed. Alternatives
/// separated by `|` are encoded independently.
///
/// ```
/// # use rayskull::version::poetry::encode_poetry_version;
/// assert_eq!(encode_poetry_version("^1.2").unwrap(), ">=1.2.0,<2.0.0");
/// assert_eq!(encode_poetry_version(">= 1, < 2").unwrap(), ">=1,<2");
/// ```
pub fn encode_poetry_version(spec: &str) -> Result<String, VersionError> {
    if spec.contains('|') {
        let alternatives = spec
            .split('|')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(encode_poetry_version)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(alternatives.join("|"));
    }

    let mut clauses = Vec::new();
    for clause in spec.split(',') {
        let clause: String = clause.chars().filter(|c| !c.is_whitespace()).collect();
        if clause.is_empty() {
            continue;
        }

        if let Some(target) = clause.strip_prefix('^') {
            let version: Version = target.parse()?;
            clauses.push(format!(">={}", version.to_padded_string()));
            clauses.push(format!("<{}", caret_ceiling(&version)));
        } else if clause.starts_with("~=") {
            clauses.push(clause);
        } else if let Some(target) = clause.strip_prefix('~') {
            let version: Version = target.parse()?;
            clauses.push(format!(">={}", version.to_padded_string()));
            clauses.push(format!("<{}", tilde_ceiling(&version)));
        } else {
            clauses.push(clause);
        }
    }

    Ok(clauses.join(","))
}
