//! Recipe writer: serialize a [`Document`] back to `meta.yaml` text.
//!
//! Sections are separated by one blank line and nested keys are indented by
//! two spaces. Empty values are left out.

use std::fmt::{self, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::recipe::node::{Entry, Item, Node, NodeId, Value};
use crate::recipe::parse::parse_item;
use crate::recipe::{Document, PreambleLine, ROOT, RecipeError, TemplateVariable};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_]\w*)\s*(?:\}\}|\||\[)").unwrap());

/// Names conda-build provides to every recipe.
pub(super) const BUILTINS: &[&str] = &[
    "PYTHON",
    "R",
    "PREFIX",
    "RECIPE_DIR",
    "SRC_DIR",
    "PY_VER",
    "PKG_NAME",
    "PKG_VERSION",
    "PKG_BUILDNUM",
    "blas",
    "r_base",
    "posix",
    "native",
    "win",
    "unix",
    "linux",
    "osx",
    "environ",
    "python",
    "python_min",
    "numpy",
    "build_platform",
    "target_platform",
    "cran_mirror",
];

impl fmt::Display for TemplateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Some(quote) => write!(f, "{{% set {} = {quote}{}{quote} %}}", self.name, self.value),
            None => write!(f, "{{% set {} = {} %}}", self.name, self.value),
        }
    }
}

pub(super) fn render(document: &Document) -> Result<String, RecipeError> {
    let mut out = String::with_capacity(1024);

    for line in &document.preamble {
        match line {
            PreambleLine::Variable(variable) => writeln!(out, "{variable}")?,
            PreambleLine::Raw(raw) => writeln!(out, "{raw}")?,
        }
    }

    if let Node::Mapping(entries) = &document.nodes[ROOT] {
        for (key, entry) in entries {
            if is_empty(document, entry.node) {
                continue;
            }
            if !out.is_empty() {
                writeln!(out)?;
            }
            write_entry(&mut out, document, key, entry, 0)?;
        }
    }

    if !document.trailer.is_empty() {
        if !out.is_empty() {
            writeln!(out)?;
        }
        for line in &document.trailer {
            writeln!(out, "{line}")?;
        }
    }

    Ok(out)
}

fn write_entry(
    out: &mut String,
    document: &Document,
    key: &str,
    entry: &Entry,
    indent: usize,
) -> fmt::Result {
    let pad = " ".repeat(indent);
    for comment in &entry.comments {
        writeln!(out, "{comment}")?;
    }
    let trailer = entry
        .trailer
        .as_ref()
        .map(|trailer| format!("  # {trailer}"))
        .unwrap_or_default();

    match &document.nodes[entry.node] {
        Node::Scalar(item) => writeln!(out, "{pad}{key}: {}", format_item(item))?,
        Node::Block(block) => {
            writeln!(out, "{pad}{key}: {}", block.indicator)?;
            for line in &block.lines {
                if line.is_empty() {
                    writeln!(out)?;
                } else {
                    writeln!(out, "{pad}  {line}")?;
                }
            }
        }
        Node::Sequence(elements) => {
            writeln!(out, "{pad}{key}:{trailer}")?;
            for element in elements.iter().filter(|element| !element.item.value.is_empty()) {
                for comment in &element.comments {
                    writeln!(out, "{comment}")?;
                }
                writeln!(out, "{pad}  - {}", format_item(&element.item))?;
            }
        }
        Node::Mapping(entries) => {
            writeln!(out, "{pad}{key}:{trailer}")?;
            for (key, entry) in entries {
                if !is_empty(document, entry.node) {
                    write_entry(out, document, key, entry, indent + 2)?;
                }
            }
        }
        Node::Empty => {}
    }
    Ok(())
}

fn is_empty(document: &Document, id: NodeId) -> bool {
    match &document.nodes[id] {
        Node::Empty => true,
        Node::Scalar(item) => item.value.is_empty(),
        Node::Block(block) => block.lines.iter().all(|line| line.trim().is_empty()),
        Node::Sequence(elements) => elements.iter().all(|element| element.item.value.is_empty()),
        Node::Mapping(entries) => entries.values().all(|entry| is_empty(document, entry.node)),
    }
}

fn format_item(item: &Item) -> String {
    if let Some(source) = item
        .source
        .as_ref()
        .filter(|source| parse_item(source, 0).is_ok_and(|parsed| parsed == *item))
    {
        return source.clone();
    }

    let mut text = match &item.value {
        Value::Text(text) if needs_quotes(text) => format!("\"{}\"", escape(text)),
        value => value.to_string(),
    };
    if let Some(guard) = &item.guard {
        text.push_str("  # [");
        text.push_str(guard);
        text.push(']');
        if let Some(comment) = &item.comment {
            text.push(' ');
            text.push_str(comment);
        }
    } else if let Some(comment) = &item.comment {
        text.push_str("  # ");
        text.push_str(comment);
    }
    text
}

/// Escape text for a double-quoted scalar.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Whether a text scalar would be misread as plain YAML.
fn needs_quotes(text: &str) -> bool {
    const RESERVED: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "~"];

    if text.contains(['\n', '\t']) {
        return true;
    }
    if text.starts_with("{{") || text.starts_with("{%") {
        return false;
    }
    if text.is_empty() || text.trim() != text {
        return true;
    }
    let mut chars = text.chars();
    let first = chars.next().unwrap_or_default();
    let second = chars.next();
    if "[]{}#&*!|>'\"%@`,".contains(first) {
        return true;
    }
    if "-?:".contains(first) && second.is_none_or(char::is_whitespace) {
        return true;
    }
    text.contains(": ")
        || text.contains(" #")
        || text.ends_with(':')
        || RESERVED.iter().any(|word| text.eq_ignore_ascii_case(word))
        || text.parse::<f64>().is_ok()
}

/// The texts of every scalar and block below `id`.
pub(super) fn visible_texts<'a>(document: &'a Document, id: NodeId, texts: &mut Vec<&'a str>) {
    match &document.nodes[id] {
        Node::Mapping(entries) => {
            for entry in entries.values() {
                visible_texts(document, entry.node, texts);
            }
        }
        Node::Sequence(elements) => {
            texts.extend(elements.iter().filter_map(|element| element.item.value.as_text()));
        }
        Node::Scalar(item) => texts.extend(item.value.as_text()),
        Node::Block(block) => texts.extend(block.lines.iter().map(String::as_str)),
        Node::Empty => {}
    }
}

/// Variable names used as `{{ name }}`, `{{ name|filter }}` or `{{ name[..] }}`.
pub(super) fn placeholders(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str())
}
