//! PEP 440 compatible release (`~=`) expansion.
//!
//! conda does not understand `~=`, so `~=X.Y.Z` is rewritten as
//! `>=X.Y.Z,<X.(Y+1).dev0`. The `.dev0` suffix keeps pre-releases of the next
//! series out of the range.

use crate::version::{Version, VersionError};

/// The exclusive ceiling of `~=version`: drop the last component, bump the
/// one before it.
pub fn compatible_release_ceiling(version: &str) -> Result<String, VersionError> {
    let parsed: Version = version.parse()?;
    let release = parsed.release();
    if release.len() < 2 {
        return Err(VersionError::CompatibleReleaseTooShort(version.trim().to_string()));
    }

    let mut upper = release[..release.len() - 1].to_vec();
    if let Some(last) = upper.last_mut() {
        *last += 1;
    }
    let upper = upper
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    Ok(format!("{upper}.dev0"))
}

/// Rewrite every `~=` clause of a comma-separated specifier into an explicit
/// range. Other clauses are kept as written.
pub fn expand_compatible_release(spec: &str) -> Result<String, VersionError> {
    let mut clauses = Vec::new();
    for clause in spec.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(version) = clause.strip_prefix("~=") {
            let version = version.trim();
            let ceiling = compatible_release_ceiling(version)?;
            clauses.push(format!(">={version},<{ceiling}"));
        } else {
            clauses.push(clause.to_string());
        }
    }
    Ok(clauses.join(","))
}
