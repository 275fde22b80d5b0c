//! Poetry `python` and `platform` markers on individual dependencies.
//!
//! A Poetry dependency such as `foo = { version = "^1", python = "<3.8",
//! platform = "darwin" }` is rendered as `foo >=1.0.0,<2.0.0  # [py<38 and osx]`.
//! Python versions only keep their major and minor components, and the minor
//! is dropped when it is zero (`3.0` is `py3`).

use crate::version::VersionError;
use crate::version::poetry::encode_poetry_version;

/// Turn a Poetry python specifier into a selector expression.
///
/// Alternatives (`|` or `||`) are joined with `or`. Comma-separated clauses
/// are joined with `and`, parenthesizing any clause that is itself an `or`.
pub fn encode_poetry_python_version_to_selector_item(spec: &str) -> Result<String, VersionError> {
    if spec.trim().is_empty() {
        return Ok(String::new());
    }

    let encoded = encode_poetry_version(spec)?;
    if encoded.contains('|') {
        let alternatives = encoded
            .split('|')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(encode_poetry_python_version_to_selector_item)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(alternatives.join(" or "));
    }

    let mut selectors = Vec::new();
    for clause in encoded.split(',') {
        let selector = parse_python_version_specifier_to_selector(clause)?;
        if !selector.is_empty() {
            selectors.push(selector);
        }
    }
    if selectors.len() > 1 {
        for selector in &mut selectors {
            if selector.contains(" or ") {
                *selector = format!("({selector})");
            }
        }
    }
    Ok(selectors.join(" and "))
}

/// Turn a single `<op><version>` clause into a selector expression.
///
/// Without an operator `==` is assumed. `~=` and `.*` wildcards may expand to
/// two atoms.
pub fn parse_python_version_specifier_to_selector(spec: &str) -> Result<String, VersionError> {
    const OPERATORS: [&str; 10] = ["^", "~=", "~", ">=", "<=", ">", "<", "!=", "===", "=="];

    let spec = spec.trim();
    let (operator, version) = OPERATORS
        .iter()
        .find_map(|operator| spec.strip_prefix(operator).map(|rest| (*operator, rest)))
        .or_else(|| spec.strip_prefix('=').map(|rest| ("=", rest)))
        .unwrap_or(("", spec));
    let version = version.trim();
    if version.is_empty() {
        return Err(VersionError::InvalidVersion(spec.to_string()));
    }

    match operator {
        "" | "=" | "==" | "===" => expand_wildcard("==", version),
        "!=" => expand_wildcard("!=", version),
        "~=" => expand_compatible_release(version),
        operator => operator_version_to_selector(operator, version),
    }
}

/// `~=3.8` is `py>=38 and py<4`, `~=3` is `py>=3`, and `~=3.8.1` is `py==38`.
fn expand_compatible_release(version: &str) -> Result<String, VersionError> {
    let release = python_release(version)?;
    let lower_operator = if release.len() < 3 { ">=" } else { "==" };
    let lower = atom(lower_operator, &release);
    if release.len() == 2 {
        let upper = atom("<", &[release[0] + 1]);
        return Ok(format!("{lower} and {upper}"));
    }
    Ok(lower)
}

/// Handle `==`/`!=` with an optional `.*` suffix.
fn expand_wildcard(operator: &str, version: &str) -> Result<String, VersionError> {
    if version == "*" {
        return Ok(if operator == "==" {
            String::new()
        } else {
            "py<0".to_string()
        });
    }

    let base = version.trim_end_matches(['.', '*']);
    let wildcard = base.len() != version.len();
    let release = python_release(base)?;

    if !wildcard {
        return Ok(atom(operator, &release));
    }

    if operator == "==" {
        if release.len() == 1 {
            return Ok(format!(
                "{} and {}",
                atom(">=", &release),
                atom("<", &[release[0] + 1])
            ));
        }
        return Ok(atom("==", &release));
    }

    let upper = match release.as_slice() {
        [major] => vec![major + 1],
        [major, minor] => vec![*major, minor + 1],
        [major, minor, ..] => vec![*major, *minor],
        [] => return Err(VersionError::InvalidVersion(version.to_string())),
    };
    Ok(format!("{} or {}", atom("<", &release), atom(">=", &upper)))
}

fn operator_version_to_selector(operator: &str, version: &str) -> Result<String, VersionError> {
    Ok(atom(operator, &python_release(version)?))
}

/// `py{op}{major}` when the minor is zero, `py{op}{major}{minor}` otherwise.
fn atom(operator: &str, release: &[u64]) -> String {
    let major = release.first().copied().unwrap_or(0);
    match release.get(1).copied().unwrap_or(0) {
        0 => format!("py{operator}{major}"),
        minor => format!("py{operator}{major}{minor}"),
    }
}

/// The numeric release of a Python version, ignoring any epoch and any
/// pre/post/dev suffix (`2!3.8.0.1post1` is `[3, 8, 0, 1]`).
fn python_release(version: &str) -> Result<Vec<u64>, VersionError> {
    let invalid = || VersionError::InvalidVersion(version.to_string());
    let text = version
        .split_once('!')
        .map_or(version, |(_, rest)| rest)
        .trim_start_matches(['v', 'V']);

    let mut release = Vec::new();
    for part in text.split('.') {
        let digits: &str = &part[..part
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(part.len())];
        if digits.is_empty() {
            break;
        }
        release.push(digits.parse().map_err(|_| invalid())?);
        if digits.len() != part.len() {
            break;
        }
    }

    if release.is_empty() {
        return Err(invalid());
    }
    Ok(release)
}

/// Map a Poetry `platform` value to a conda selector, or `""` when unknown.
pub fn encode_poetry_platform_to_selector_item(platform: &str) -> &'static str {
    match platform.trim().to_lowercase().as_str() {
        "windows" | "win32" => "win",
        "linux" => "linux",
        "darwin" => "osx",
        _ => "",
    }
}

/// Combine python and platform selectors into a trailing `  # [...]` comment.
///
/// Returns an empty string when both are empty.
pub fn combine_selectors(python: &str, platform: &str) -> String {
    let selector = match (python.is_empty(), platform.is_empty()) {
        (false, false) if python.contains(" or ") => format!("({python}) and {platform}"),
        (false, false) => format!("{python} and {platform}"),
        (false, true) => python.to_string(),
        (true, false) => platform.to_string(),
        (true, true) => return String::new(),
    };
    format!("  # [{selector}]")
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(">=3.8", "py>=38"; "lower bound")]
    #[test_case("3.12", "py==312"; "bare version")]
    #[test_case("<4.0.0", "py<4"; "zero minor")]
    #[test_case("<4.0.0.1", "py<4"; "four components")]
    #[test_case(">=3", "py>=3"; "major only")]
    #[test_case(">=3.8.0.1a0", "py>=38"; "pre release suffix")]
    #[test_case("~=3.8", "py>=38 and py<4"; "compatible major minor")]
    #[test_case("~=3", "py>=3"; "compatible major")]
    #[test_case("~=3.8.1", "py==38"; "compatible patch")]
    #[test_case("3.*", "py>=3 and py<4"; "major wildcard")]
    #[test_case("!=3.*", "py<3 or py>=4"; "excluded major wildcard")]
    #[test_case("==3.12.*", "py==312"; "minor wildcard")]
    #[test_case("!=3.12.*", "py<312 or py>=313"; "excluded minor wildcard")]
    #[test_case("!=3.9.1.*", "py<39 or py>=39"; "excluded patch wildcard")]
    #[test_case("!=*", "py<0"; "excluded everything")]
    #[test_case("==*", ""; "anything")]
    fn single_clause(spec: &str, expected: &str) {
        assert_eq!(parse_python_version_specifier_to_selector(spec).unwrap(), expected);
    }

    #[test_case("3", "py==3"; "bare major")]
    #[test_case("!=3.8.1", "py!=38"; "exclusion drops patch")]
    #[test_case("^3.10", "py>=310 and py<4"; "caret")]
    #[test_case("~3.10", "py>=310 and py<311"; "tilde")]
    #[test_case(">=3.8,<3.12,!=3.11", "py>=38 and py<312 and py!=311"; "and clauses")]
    #[test_case("<3.8|>=3.10,!=3.11", "py<38 or py>=310 and py!=311"; "or clauses")]
    #[test_case("~=3.8,!=3.11", "py>=38 and py<4 and py!=311"; "compatible and exclusion")]
    #[test_case("*", ""; "wildcard")]
    #[test_case("3.*,!=3.11", "py>=3 and py<4 and py!=311"; "wildcard and exclusion")]
    #[test_case("!=3.*|3.11", "py<3 or py>=4 or py==311"; "excluded wildcard or version")]
    #[test_case("!=3.*,!=4.1", "(py<3 or py>=4) and py!=41"; "parenthesized or")]
    fn python_specifier(spec: &str, expected: &str) {
        assert_eq!(
            encode_poetry_python_version_to_selector_item(spec).unwrap(),
            expected
        );
    }

    #[test]
    fn platforms() {
        assert_eq!(encode_poetry_platform_to_selector_item("Darwin"), "osx");
        assert_eq!(encode_poetry_platform_to_selector_item("windows"), "win");
        assert_eq!(encode_poetry_platform_to_selector_item("freebsd"), "");
    }

    #[test]
    fn combined() {
        assert_eq!(combine_selectors("py<38", "osx"), "  # [py<38 and osx]");
        assert_eq!(
            combine_selectors("py<3 or py>=4", "win"),
            "  # [(py<3 or py>=4) and win]"
        );
        assert_eq!(combine_selectors("", "linux"), "  # [linux]");
        assert_eq!(combine_selectors("", ""), "");
    }
}
