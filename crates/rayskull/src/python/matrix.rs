//! The interpreter support matrix.

use std::collections::BTreeMap;

use crate::python::{InterpreterClause, PyVer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    enabled: bool,
    /// Whether the version came from the configured baseline rather than
    /// from a clause.
    baseline: bool,
}

/// Which interpreter versions a package supports, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportMatrix {
    entries: BTreeMap<PyVer, Entry>,
}

impl SupportMatrix {
    /// Start from `baseline` with every version enabled, add the versions the
    /// clauses name, and AND every clause over all of them.
    pub fn build(baseline: &[PyVer], clauses: &[InterpreterClause]) -> Self {
        let mut entries = BTreeMap::new();
        for &version in baseline {
            entries.insert(
                version,
                Entry {
                    enabled: true,
                    baseline: true,
                },
            );
        }
        for clause in clauses {
            entries.entry(clause.version).or_insert(Entry {
                enabled: true,
                baseline: false,
            });
        }

        for (version, entry) in &mut entries {
            entry.enabled = clauses
                .iter()
                .all(|clause| clause.comparison.evaluate(*version, clause.version));
        }

        Self { entries }
    }

    /// `None` when the version is not part of the matrix.
    pub fn is_enabled(&self, version: PyVer) -> Option<bool> {
        self.entries.get(&version).map(|entry| entry.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PyVer, bool)> + '_ {
        self.entries
            .iter()
            .map(|(version, entry)| (*version, entry.enabled))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_enabled(&self) -> bool {
        self.entries.values().all(|entry| entry.enabled)
    }

    /// The oldest enabled Python 3 (or newer) version, preferring versions from
    /// the baseline over versions only named by a clause.
    pub fn oldest_py3(&self) -> Option<PyVer> {
        let mut fallback = None;
        for (version, entry) in &self.entries {
            if !entry.enabled || version.major < 3 {
                continue;
            }
            if entry.baseline {
                return Some(*version);
            }
            fallback.get_or_insert(*version);
        }
        fallback
    }

    pub(crate) fn versions(&self) -> Vec<PyVer> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn flags(&self) -> Vec<bool> {
        self.entries.values().map(|entry| entry.enabled).collect()
    }
}
