//! Merging requirement lists from several metadata sources.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::metadata::MetadataError;
use crate::requirements::{NameRegistry, Requirement, RequirementRecord, RequirementSections};

static COMPILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*[<{]\{\s*compiler\(['"]\w+['"]\)\s*\}\}\s*$"#).unwrap());

/// The result of [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub requirements: Vec<Requirement>,
    /// Names the registry did not know under any spelling.
    pub possibly_unavailable: Vec<String>,
}

/// Merge requirement lists, earlier sources first.
///
/// Names are resolved through the registry; unresolved names keep their
/// spelling and are reported. Duplicates are detected on the lowercase name
/// with `_` read as `-`, and the first entry wins. The result is sorted by
/// name, ignoring case.
pub fn merge(sources: &[Vec<Requirement>], registry: &dyn NameRegistry) -> MergeOutcome {
    let mut seen = FxHashSet::default();
    let mut outcome = MergeOutcome::default();

    for requirement in sources.iter().flatten() {
        if requirement.is_symbolic() {
            if seen.insert(requirement.to_string()) {
                outcome.requirements.push(requirement.clone());
            }
            continue;
        }

        let name = match registry.resolve(requirement.name()) {
            Some(name) => name,
            None => {
                if !outcome
                    .possibly_unavailable
                    .iter()
                    .any(|missing| missing == requirement.name())
                {
                    outcome.possibly_unavailable.push(requirement.name().to_string());
                }
                requirement.name().to_string()
            }
        };

        if !seen.insert(dedup_key(&name)) {
            tracing::debug!("Dropping duplicate requirement `{requirement}`");
            continue;
        }
        outcome.requirements.push(requirement.clone().with_name(name));
    }

    outcome
        .requirements
        .sort_by_cached_key(|requirement| requirement.name().to_lowercase());
    outcome
}

/// Merge raw records. Records are grouped by source priority, keeping their
/// order within a group; extras and test-only records are skipped.
pub fn merge_records(
    records: &[RequirementRecord],
    registry: &dyn NameRegistry,
) -> Result<MergeOutcome, MetadataError> {
    let mut groups: BTreeMap<_, Vec<Requirement>> = BTreeMap::new();
    for record in records {
        if record.is_skipped() {
            tracing::debug!("Skipping `{}`: optional or test dependency", record.name);
            continue;
        }
        groups
            .entry(record.source_priority)
            .or_default()
            .push(Requirement::from_record(record)?);
    }
    let sources: Vec<Vec<Requirement>> = groups.into_values().collect();
    Ok(merge(&sources, registry))
}

fn dedup_key(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

/// Pin run requirements to their build-time version for compiled packages.
///
/// Only applies when `build` carries a `{{ compiler('..') }}` entry. Every host
/// package found in `table` replaces its run entry with the pin expression.
pub fn apply_pin_compatible(sections: &mut RequirementSections, table: &BTreeMap<String, String>) {
    if !sections
        .build
        .iter()
        .any(|requirement| COMPILER.is_match(requirement.name()))
    {
        return;
    }

    let mut pinned = FxHashSet::default();
    for host in &sections.host {
        let key = dedup_key(host.name());
        if host.is_symbolic() || !pinned.insert(key.clone()) {
            continue;
        }
        let Some(pin) = table.get(host.name()) else {
            continue;
        };
        sections.run.retain(|run| dedup_key(run.name()) != key);
        if !sections.run.iter().any(|run| run.name() == pin.as_str()) {
            sections.run.push(Requirement::symbolic(pin.clone(), None));
        }
    }
}
