//! Package metadata records.
//!
//! Each submodule reads one upstream format into plain data:
//!
//! - [`pypi`]: the `info` object of the PyPI JSON API
//! - [`sdist`]: what the build backend reports about a source distribution
//! - [`pyproject`]: `pyproject.toml` (PEP 621, Poetry, Flit and PEP 725)
//! - [`cran`]: an R package `DESCRIPTION` file

use crate::version::VersionError;

pub mod cran;
pub mod pyproject;
pub mod pypi;
pub mod sdist;

/// Errors raised while reading metadata records.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Missing required field `{0}`")]
    MissingField(String),
    #[error("Invalid JSON metadata")]
    Json(#[from] serde_json::Error),
    #[error("Invalid TOML metadata")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid requirement: {0}")]
    InvalidRecord(String),
    #[error("Invalid constraint `{raw}` for `{name}`")]
    InvalidConstraint {
        name: String,
        raw: String,
        #[source]
        source: VersionError,
    },
    #[error(transparent)]
    Version(#[from] VersionError),
}
