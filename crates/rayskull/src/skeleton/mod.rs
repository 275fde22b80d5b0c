//! Recipe skeletons: fill a [`Document`] from package metadata.

use crate::recipe::Document;

pub mod cran;
pub mod python;

/// A generated recipe and the warnings raised while building it.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub document: Document,
    pub warnings: Vec<String>,
}
