//! R recipes from a CRAN `DESCRIPTION` file.

use std::collections::{BTreeMap, btree_map};

use anyhow::{Result, bail};

use crate::config::Configuration;
use crate::metadata::cran::Description;
use crate::recipe::Document;
use crate::skeleton::Skeleton;
use crate::version::cran::CranDependency;

const R_INSTALL: &str = "R CMD INSTALL --build . $R_ARGS";

/// Build the recipe for an R package.
pub fn cran_recipe(description: &Description, config: &Configuration) -> Result<Skeleton> {
    let name = description.package();
    let Some(version) = description.version() else {
        bail!("No version found for `{name}`");
    };
    let mut warnings = Vec::new();

    let mut document = Document::new(name, version)?;
    document.set("package.name", "r-{{ name|lower }}")?;
    if version.contains('-') {
        document.set("package.version", "{{ version|replace(\"-\", \"_\") }}")?;
    }

    let compiled = description.needs_compilation();
    if compiled {
        document.set_expression("posix", "'m2-' if win else ''");
    }

    document.add_item(
        "source.url",
        "{{ cran_mirror }}/src/contrib/{{ name }}_{{ version }}.tar.gz",
        None,
    )?;
    document.add_item(
        "source.url",
        "{{ cran_mirror }}/src/contrib/Archive/{{ name }}/{{ name }}_{{ version }}.tar.gz",
        None,
    )?;

    if !compiled {
        document.set("build.noarch", "generic")?;
    }
    document.set("build.number", 0_i64)?;
    document.set_with_guard("build.merge_build_host", true, Some("win".to_string()))?;
    document.set("build.script", R_INSTALL)?;
    document.add_item("build.rpaths", "lib/R/lib/", None)?;
    document.add_item("build.rpaths", "lib/", None)?;

    if compiled {
        let guarded = [
            (
                "cross-r-base {{ r_base }}",
                Some("build_platform != target_platform"),
            ),
            ("{{ compiler('c') }}", Some("not win")),
            ("{{ compiler('m2w64_c') }}", Some("win")),
            ("{{ posix }}make", None),
        ];
        for (line, guard) in guarded {
            document.add_item("requirements.build", line, guard.map(str::to_string))?;
        }
    }

    let depends = description.depends()?;
    let imports = description.imports()?;
    let linking_to = description.linking_to()?;

    let r_base = depends
        .iter()
        .find(|dependency| dependency.is_r())
        .map_or_else(|| "r-base".to_string(), CranDependency::to_requirement_line);
    let run = sorted_lines(depends.iter().chain(&imports));
    let host = sorted_lines(depends.iter().chain(&imports).chain(&linking_to));
    for line in std::iter::once(&r_base).chain(&host) {
        document.add_item("requirements.host", line, None)?;
    }
    for line in std::iter::once(&r_base).chain(&run) {
        document.add_item("requirements.run", line, None)?;
    }

    document.add_item(
        "test.commands",
        format!("$R -e \"library('{name}')\""),
        Some("not win".to_string()),
    )?;
    document.add_item(
        "test.commands",
        format!("\"%R%\" -e \"library('{name}')\""),
        Some("win".to_string()),
    )?;

    let home = description.url().map_or_else(
        || format!("https://CRAN.R-project.org/package={name}"),
        str::to_string,
    );
    document.set("about.home", home)?;
    if let Some(title) = description.title() {
        document.set("about.summary", title)?;
    }
    if let Some(text) = description.description() {
        document.set("about.description", text)?;
    }
    match description.license() {
        Some(license) => document.set("about.license", license)?,
        None => warnings.push(format!("No license found for `{name}`, please add one")),
    }
    if let Some(bug_reports) = description.bug_reports() {
        document.set("about.dev_url", bug_reports)?;
    }

    for maintainer in &config.maintainers {
        document.add_item("extra.recipe-maintainers", maintainer, None)?;
    }

    for line in description.lines() {
        document.add_trailer(line);
    }

    document.reduce_all();
    Ok(Skeleton { document, warnings })
}

/// Conda requirement lines for non-R dependencies, sorted by name. A
/// constrained entry replaces an unconstrained one for the same package.
fn sorted_lines<'a>(dependencies: impl Iterator<Item = &'a CranDependency>) -> Vec<String> {
    let mut lines: BTreeMap<String, String> = BTreeMap::new();
    for dependency in dependencies.filter(|dependency| !dependency.is_r()) {
        let line = dependency.to_requirement_line();
        match lines.entry(dependency.conda_name()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(line);
            }
            btree_map::Entry::Occupied(mut entry) => {
                if !dependency.constraint.is_empty() {
                    entry.insert(line);
                }
            }
        }
    }
    lines.into_values().collect()
}
