//! `rayskull merge`: combine requirement records from several metadata
//! sources into one list of conda requirement lines.

use anyhow::{Context, Result};

use crate::cli::MergeArgs;
use crate::commands::{ExitStatus, load_registry};
use crate::printer::Printer;
use crate::requirements::{RequirementRecord, merge_records};

pub(crate) fn execute(args: &MergeArgs, printer: Printer) -> Result<ExitStatus> {
    let registry = load_registry(args.available.as_deref())?;

    let mut records: Vec<RequirementRecord> = Vec::new();
    for path in &args.records {
        let content = fs_err::read_to_string(path)?;
        let parsed: Vec<RequirementRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse requirement records in `{}`", path.display()))?;
        printer.debug(&format!("{} records from `{}`", parsed.len(), path.display()));
        records.extend(parsed);
    }

    let outcome = merge_records(&records, registry.as_ref())?;
    for name in &outcome.possibly_unavailable {
        printer.warn(&format!("`{name}` may not be available on conda-forge"));
    }

    if outcome.requirements.is_empty() {
        printer.info("No requirements to merge");
        return Ok(ExitStatus::Success);
    }
    let lines: Vec<String> = outcome
        .requirements
        .iter()
        .map(ToString::to_string)
        .collect();
    printer.result(&lines.join("\n"))?;
    Ok(ExitStatus::Success)
}
