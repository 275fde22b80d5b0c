//! Arena nodes of a recipe document.

use std::fmt;

use indexmap::IndexMap;

pub(crate) type NodeId = usize;

/// A scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Read a plain (unquoted) scalar.
    pub(crate) fn from_plain(text: &str) -> Self {
        match text {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            _ => match text.parse::<i64>() {
                Ok(number) if number.to_string() == text => Self::Integer(number),
                _ => Self::Text(text.to_string()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(number) => write!(f, "{number}"),
            Self::Boolean(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for Value {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Integer(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Boolean(flag)
    }
}

/// A scalar with its selector guard and trailing comment.
///
/// Items read from a file remember their source text. The writer emits that
/// text again as long as it still reads back as the same item, so quoting and
/// comment spacing survive a load and render.
#[derive(Debug, Clone)]
pub struct Item {
    pub value: Value,
    pub guard: Option<String>,
    pub comment: Option<String>,
    pub(crate) source: Option<String>,
}

impl Item {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            guard: None,
            comment: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment.filter(|comment| !comment.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Option<String>) -> Self {
        self.guard = guard.filter(|guard| !guard.trim().is_empty());
        self
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.guard == other.guard && self.comment == other.comment
    }
}

impl Eq for Item {}

/// A key of a mapping: the lines attached above it and the node it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) node: NodeId,
    pub(crate) comments: Vec<String>,
    /// A comment written after `key:` when the value is on the next lines.
    pub(crate) trailer: Option<String>,
}

/// A sequence item with the lines attached above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) item: Item,
    pub(crate) comments: Vec<String>,
}

/// A literal (`|`) or folded (`>`) block scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    pub(crate) indicator: String,
    pub(crate) lines: Vec<String>,
}

impl Block {
    /// Hold multi-line text, keeping or stripping its final newline.
    pub(crate) fn from_text(text: &str) -> Self {
        let indicator = if text.ends_with('\n') { "|" } else { "|-" };
        Self {
            indicator: indicator.to_string(),
            lines: text.lines().map(|line| line.trim_end().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Mapping(IndexMap<String, Entry>),
    Sequence(Vec<Element>),
    Scalar(Item),
    Block(Block),
    Empty,
}

impl Node {
    pub(crate) fn mapping() -> Self {
        Self::Mapping(IndexMap::new())
    }
}
