//! PEP 508 environment markers as conda selectors.
//!
//! Only the variables that have a conda selector counterpart are translated:
//! `python_version`, `sys_platform` and `platform_system`. `extra` atoms are
//! used to decide whether a requirement is skipped altogether. Anything else is
//! dropped from the guard.

use std::sync::LazyLock;

use regex::Regex;

static MARKER_ATOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:(\())?\s*([\.a-zA-Z0-9_-]+)\s*([=!<>]+)\s*['"]*([\.a-zA-Z0-9_-]+)['"]*\s*(?:(\)))?\s*(?:(and|or))?"#,
    )
    .unwrap()
});

/// One `variable <op> value` comparison, with the punctuation around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerAtom {
    pub open: bool,
    pub variable: String,
    pub operator: String,
    pub value: String,
    pub close: bool,
    pub connector: Option<String>,
}

impl MarkerAtom {
    /// The selector for this comparison, or `""` when it has none.
    pub fn to_selector(&self) -> String {
        let negated = self.operator == "!=";
        let platform = match self.variable.as_str() {
            "python_version" => {
                let digits: String = self.value.split('.').take(2).collect();
                return format!("py{}{digits}", self.operator);
            }
            "sys_platform" => self
                .value
                .chars()
                .filter(char::is_ascii_alphabetic)
                .collect::<String>()
                .to_lowercase(),
            "platform_system" => match self.value.trim().to_lowercase().as_str() {
                "windows" => "win".to_string(),
                "linux" => "linux".to_string(),
                "darwin" => "osx".to_string(),
                other => other.to_string(),
            },
            _ => return String::new(),
        };
        if negated {
            format!("not {platform}")
        } else {
            platform
        }
    }
}

/// Split a marker expression into its comparisons.
pub fn parse_marker(marker: &str) -> Vec<MarkerAtom> {
    MARKER_ATOM
        .captures_iter(marker)
        .map(|captures| MarkerAtom {
            open: captures.get(1).is_some(),
            variable: captures[2].to_string(),
            operator: captures[3].to_string(),
            value: captures[4].to_string(),
            close: captures.get(5).is_some(),
            connector: captures.get(6).map(|connector| connector.as_str().to_string()),
        })
        .collect()
}

/// Whether a requirement carrying this marker is left out of the recipe:
/// optional extras and test-only dependencies.
pub fn should_skip(atoms: &[MarkerAtom]) -> bool {
    atoms.iter().any(|atom| {
        atom.variable == "extra" || matches!(atom.value.as_str(), "test" | "tests" | "testing")
    })
}

/// The selector expression for a marker, keeping its parentheses and
/// connectors. Returns `None` when nothing translates.
pub fn marker_to_guard(atoms: &[MarkerAtom]) -> Option<String> {
    let mut tokens: Vec<String> = Vec::new();
    for atom in atoms {
        let selector = atom.to_selector();
        if selector.is_empty() {
            continue;
        }
        if atom.open {
            tokens.push("(".to_string());
        }
        tokens.push(selector);
        if atom.close {
            tokens.push(")".to_string());
        }
        if let Some(connector) = &atom.connector {
            tokens.push(connector.clone());
        }
    }
    if tokens.last().is_some_and(|last| last == "and" || last == "or") {
        tokens.pop();
    }
    if tokens.is_empty() {
        return None;
    }
    Some(tokens.join(" "))
}

/// The outcome of translating the marker half of a requirement line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerGuard {
    pub skip: bool,
    pub guard: Option<String>,
    /// Any translated marker makes the recipe platform specific.
    pub needs_arch: bool,
}

/// Translate a raw marker expression.
pub fn translate(marker: &str) -> MarkerGuard {
    let atoms = parse_marker(marker);
    if should_skip(&atoms) {
        return MarkerGuard {
            skip: true,
            ..MarkerGuard::default()
        };
    }
    MarkerGuard {
        skip: false,
        needs_arch: !atoms.is_empty(),
        guard: marker_to_guard(&atoms),
    }
}
