//! Selector algebra: from a [`SupportMatrix`] to the smallest guard that
//! describes it.
//!
//! The same matrix can be rendered two ways. In [`RenderMode::Selector`] the
//! result is a conda selector that marks the *unsupported* variants, for
//! `skip: true  # [py<38]`. In [`RenderMode::Constraint`] it is a version
//! range for the `python` requirement itself, such as `>=3.8`.
//!
//! Reduction rules, in order:
//!
//! 1. everything enabled: nothing to say
//! 2. only the legacy 2.x slot disabled: `py2k` / `>=<oldest py3>`
//! 3. only the legacy 2.x slot enabled: `py3k` / `<3.0`
//! 4. a disabled prefix followed by an enabled suffix: `py<NN` / `>=X.Y`
//! 5. an enabled prefix followed by a disabled suffix: `py>=NN` / `<X.Y`
//!    (`py>=NN or py2k` when only the legacy slot sits below the prefix)
//! 6. otherwise one exclusion per disabled version, in ascending order
//!
//! The legacy rules only apply outside strict conda-forge mode.

use crate::config::Configuration;
use crate::python::{PyVer, SupportMatrix, parse_requires_python};

/// How a matrix is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// A `# [...]` selector over the disabled variants.
    Selector,
    /// A version range for the `python` requirement.
    Constraint,
}

/// Render the matrix. Selector mode output is wrapped as `# [expr]`.
pub fn render(matrix: &SupportMatrix, mode: RenderMode, strict: bool) -> Option<String> {
    let expression = render_expression(matrix, mode, strict)?;
    Some(match mode {
        RenderMode::Selector => format!("# [{expression}]"),
        RenderMode::Constraint => expression,
    })
}

/// Render the matrix without the `# [...]` wrapping.
pub fn render_expression(matrix: &SupportMatrix, mode: RenderMode, strict: bool) -> Option<String> {
    let versions = matrix.versions();
    let flags = matrix.flags();
    if flags.iter().all(|enabled| *enabled) {
        return None;
    }

    let oldest = matrix.oldest_py3();
    let legacy = !strict && versions.first().is_some_and(|version| version.major == 2);

    if legacy && flags[1..].iter().all(|enabled| *enabled) {
        return match mode {
            RenderMode::Selector => Some("py2k".to_string()),
            RenderMode::Constraint => oldest.map(|version| format!(">={version}")),
        };
    }
    if legacy && flags[0] && !flags[1..].iter().any(|enabled| *enabled) {
        return Some(match mode {
            RenderMode::Selector => "py3k".to_string(),
            RenderMode::Constraint => "<3.0".to_string(),
        });
    }

    let legacy_disabled = legacy && !flags[0];
    if let Some((first, end)) = enabled_window(&flags) {
        if end == flags.len() {
            let lower = versions[first];
            return Some(match mode {
                RenderMode::Selector => format!("py<{}", lower.selector_digits()),
                RenderMode::Constraint => format!(">={lower}"),
            });
        }

        let upper = versions[end];
        if first == 0 {
            return Some(match mode {
                RenderMode::Selector => format!("py>={}", upper.selector_digits()),
                RenderMode::Constraint => format!("<{upper}"),
            });
        }

        // Only the legacy slot is disabled below the enabled prefix.
        if legacy_disabled && first == 1 {
            return Some(match mode {
                RenderMode::Selector => format!("py>={} or py2k", upper.selector_digits()),
                RenderMode::Constraint => match oldest {
                    Some(oldest) => format!(">={oldest},<{upper}"),
                    None => format!("<{upper}"),
                },
            });
        }
    }

    tracing::trace!("No single boundary for {matrix:?}, rendering exclusions");
    Some(exclusions(&versions, &flags, mode, strict, legacy_disabled, oldest))
}

/// The `[first, end)` range of enabled versions, when they are contiguous.
fn enabled_window(flags: &[bool]) -> Option<(usize, usize)> {
    let first = flags.iter().position(|enabled| *enabled)?;
    let end = flags.iter().rposition(|enabled| *enabled)? + 1;
    flags[first..end]
        .iter()
        .all(|enabled| *enabled)
        .then_some((first, end))
}

fn exclusions(
    versions: &[PyVer],
    flags: &[bool],
    mode: RenderMode,
    strict: bool,
    legacy_disabled: bool,
    oldest: Option<PyVer>,
) -> String {
    let mut atoms = Vec::new();
    if legacy_disabled {
        match mode {
            RenderMode::Selector => atoms.push("py2k".to_string()),
            RenderMode::Constraint => {
                if let Some(oldest) = oldest {
                    atoms.push(format!(">={oldest}"));
                }
            }
        }
    }

    for (version, enabled) in versions.iter().zip(flags) {
        if *enabled || (!strict && version.major == 2) {
            continue;
        }
        atoms.push(match mode {
            RenderMode::Selector => format!("py=={}", version.selector_digits()),
            RenderMode::Constraint => format!("!={version}"),
        });
    }

    match mode {
        RenderMode::Selector => atoms.join(" or "),
        RenderMode::Constraint => atoms.join(","),
    }
}

/// The `# [...]` skip selector for a package's `requires_python`.
pub fn py_version_to_selector(requires_python: &str, config: &Configuration) -> Option<String> {
    selector_expression(requires_python, config).map(|expression| format!("# [{expression}]"))
}

/// The bare skip selector expression for a package's `requires_python`.
pub fn selector_expression(requires_python: &str, config: &Configuration) -> Option<String> {
    if requires_python.trim().is_empty() {
        return None;
    }
    let matrix = config.support_matrix(&parse_requires_python(requires_python));
    render_expression(&matrix, RenderMode::Selector, config.strict_conda_forge)
}

/// The version range to attach to the `python` requirement.
///
/// In strict conda-forge mode a floor is always returned, the oldest
/// conda-forge interpreter when nothing narrower applies.
pub fn py_version_to_limit_python(requires_python: &str, config: &Configuration) -> Option<String> {
    let limit = if requires_python.trim().is_empty() {
        None
    } else {
        let matrix = config.support_matrix(&parse_requires_python(requires_python));
        render_expression(&matrix, RenderMode::Constraint, config.strict_conda_forge)
    };

    match limit {
        None if config.strict_conda_forge => config
            .conda_forge_python
            .first()
            .map(|oldest| format!(">={oldest}")),
        limit => limit,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn small_baseline() -> Vec<PyVer> {
        vec![
            PyVer::new(2, 7),
            PyVer::new(3, 6),
            PyVer::new(3, 7),
            PyVer::new(3, 8),
        ]
    }

    fn render_both(requires_python: &str, baseline: &[PyVer]) -> (Option<String>, Option<String>) {
        let matrix = SupportMatrix::build(baseline, &parse_requires_python(requires_python));
        (
            render(&matrix, RenderMode::Selector, false),
            render(&matrix, RenderMode::Constraint, false),
        )
    }

    #[test]
    fn lower_bound_below_baseline() {
        let (selector, constraint) = render_both(">=3.5", &small_baseline());
        assert_eq!(selector.as_deref(), Some("# [py2k]"));
        assert_eq!(constraint.as_deref(), Some(">=3.6"));
    }

    #[test]
    fn inclusive_upper_bound() {
        let (selector, constraint) = render_both("<=3.7", &small_baseline());
        assert_eq!(selector.as_deref(), Some("# [py>=38]"));
        assert_eq!(constraint.as_deref(), Some("<3.8"));
    }

    #[test]
    fn unconstrained_matrix_needs_no_guard() {
        assert_eq!(render_both(">=2.7", &small_baseline()), (None, None));
    }

    #[test_case(">=3.5", "py2k", ">=3.6"; "lower bound below baseline")]
    #[test_case("<=3.7", "py>=38", "<3.8"; "inclusive upper bound")]
    #[test_case("<3.7", "py>=37", "<3.7"; "exclusive upper bound")]
    #[test_case("!=3.7", "py==37", "!=3.7"; "single exclusion")]
    #[test_case("~=3.7", "py<37", ">=3.7"; "compatible release")]
    #[test_case(">=2.7, !=3.6.*", "py==36", "!=3.6"; "wildcard exclusion")]
    #[test_case("<3", "py3k", "<3.0"; "legacy only")]
    #[test_case(">2.7, !=3.0.*, !=3.1.*, !=3.2.*, !=3.3.*, !=3.4.*", "py<36", ">=3.6"; "python 3 early releases excluded")]
    #[test_case(">=3.6,<3.9", "py>=39 or py2k", ">=3.6,<3.9"; "enabled prefix above legacy")]
    #[test_case(">=3.6,!=3.8", "py2k or py==38", ">=3.6,!=3.8"; "legacy and exclusion")]
    #[test_case(">=3.10", "py<310", ">=3.10"; "two digit minor")]
    fn default_baseline(requires_python: &str, selector: &str, limit: &str) {
        let config = Configuration::default();
        assert_eq!(
            py_version_to_selector(requires_python, &config),
            Some(format!("# [{selector}]"))
        );
        assert_eq!(
            py_version_to_limit_python(requires_python, &config).as_deref(),
            Some(limit)
        );
    }

    fn strict_config() -> Configuration {
        Configuration {
            strict_conda_forge: true,
            ..Configuration::default()
        }
    }

    #[test]
    fn strict_mode_always_has_a_floor() {
        let config = strict_config();
        assert_eq!(py_version_to_selector(">=3.5", &config), None);
        assert_eq!(py_version_to_limit_python(">=3.5", &config).as_deref(), Some(">=3.7"));
        assert_eq!(py_version_to_limit_python("", &config).as_deref(), Some(">=3.7"));
    }

    #[test]
    fn strict_mode_only_considers_conda_forge_interpreters() {
        let config = strict_config();
        assert_eq!(py_version_to_selector("<3.9", &config).as_deref(), Some("# [py>=39]"));
        assert_eq!(py_version_to_limit_python("<3.9", &config).as_deref(), Some("<3.9"));
        assert_eq!(py_version_to_selector(">=3.8", &config).as_deref(), Some("# [py<38]"));
    }

    #[test]
    fn enabled_window_falls_back_to_exclusions() {
        let baseline = [
            PyVer::new(3, 6),
            PyVer::new(3, 7),
            PyVer::new(3, 8),
            PyVer::new(3, 9),
        ];
        let (selector, constraint) = render_both(">=3.7,<3.9", &baseline);
        assert_eq!(selector.as_deref(), Some("# [py==36 or py==39]"));
        assert_eq!(constraint.as_deref(), Some("!=3.6,!=3.9"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let matrix = SupportMatrix::build(&small_baseline(), &parse_requires_python("!=3.6,!=3.8"));
        let first = render(&matrix, RenderMode::Selector, false);
        let second = render(&matrix, RenderMode::Selector, false);
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("# [py==36 or py==38]"));
    }

    #[test]
    fn empty_requires_python() {
        let config = Configuration::default();
        assert_eq!(py_version_to_selector("", &config), None);
        assert_eq!(py_version_to_limit_python(" ", &config), None);
    }
}
