//! Integration tests for rayskull.
//!
//! Following the single-integration-test pattern from:
//! <https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html>

pub(crate) mod common;

mod config;
mod cran;
mod help;
mod merge;
mod pypi;
mod pyproject;
mod selector;
mod verbosity;
mod version;
