//! The recipe document: `meta.yaml` with selectors and template variables.
//!
//! A [`Document`] owns an arena of nodes, the preamble of `{% set %}`
//! statements and the comments that trail the last section. Paths into the
//! document are dot separated (`requirements.host`).
//!
//! Loading and rendering keep comments, guards and template statements, so a
//! normalized recipe survives `render(load(text))` unchanged.

use std::sync::LazyLock;

use regex::Regex;

use crate::recipe::node::{Block, Element, Entry, Node, NodeId};

mod node;
mod parse;
mod writer;

pub use node::{Item, Value};

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*([A-Za-z_]\w*)\s*\}\}$").unwrap());

/// Sections whose single-entry lists are kept as lists.
const KEEP_SEQUENCES: &[&str] = &["requirements", "entry_points", "test", "extra"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Undefined template variable `{0}`")]
    UndefinedVariable(String),
    #[error("Duplicate key `{key}` on line {line}")]
    DuplicateKey { key: String, line: usize },
    #[error("Unexpected indentation on line {0}")]
    UnexpectedIndent(usize),
    #[error("Unsupported syntax on line {line}: {reason}")]
    Unsupported { line: usize, reason: &'static str },
    #[error("`{0}` is not a sequence")]
    NotASequence(String),
    #[error("`{0}` is not a mapping")]
    NotAMapping(String),
    #[error(transparent)]
    Format(#[from] std::fmt::Error),
}

/// A `{% set name = value %}` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub value: String,
    /// The quote around the value; `None` for a raw Jinja expression.
    pub quote: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PreambleLine {
    Variable(TemplateVariable),
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    preamble: Vec<PreambleLine>,
    trailer: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![Node::mapping()],
            preamble: Vec::new(),
            trailer: Vec::new(),
        }
    }
}

const ROOT: NodeId = 0;

impl Document {
    /// A recipe for `name` at `version`, with the two variables declared.
    pub fn new(name: &str, version: &str) -> Result<Self, RecipeError> {
        let mut document = Self::default();
        document.set_variable("name", name);
        document.set_variable("version", version);
        document.set("package.name", "{{ name|lower }}")?;
        document.set("package.version", "{{ version }}")?;
        Ok(document)
    }

    pub fn load(text: &str) -> Result<Self, RecipeError> {
        let loaded = parse::load(text)?;
        Ok(Self {
            nodes: loaded.nodes,
            preamble: loaded.preamble,
            trailer: loaded.trailer,
        })
    }

    /// The scalar at `path`.
    pub fn get(&self, path: &str) -> Option<&Item> {
        match &self.nodes[self.find(path)?] {
            Node::Scalar(item) => Some(item),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// The items at `path`: every element of a sequence, or the lone scalar.
    pub fn items(&self, path: &str) -> Vec<&Item> {
        match self.find(path).map(|id| &self.nodes[id]) {
            Some(Node::Sequence(elements)) => elements.iter().map(|element| &element.item).collect(),
            Some(Node::Scalar(item)) => vec![item],
            _ => Vec::new(),
        }
    }

    /// The keys of the mapping at `path`, or of the root for `""`.
    pub fn keys(&self, path: &str) -> Vec<&str> {
        let id = if path.is_empty() { Some(ROOT) } else { self.find(path) };
        match id.map(|id| &self.nodes[id]) {
            Some(Node::Mapping(entries)) => entries.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Set the value at `path`, creating intermediate mappings.
    ///
    /// Text spanning several lines is stored as a block scalar.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), RecipeError> {
        let node = match value.into() {
            Value::Text(text) if text.contains('\n') => Node::Block(Block::from_text(&text)),
            value => Node::Scalar(Item::new(value)),
        };
        self.replace(path, node)
    }

    pub fn set_with_guard(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        guard: Option<String>,
    ) -> Result<(), RecipeError> {
        self.replace(path, Node::Scalar(Item::new(value).with_guard(guard)))
    }

    /// Append an item to the sequence at `path`.
    ///
    /// A missing or empty value becomes a new sequence and a scalar becomes
    /// the first element.
    pub fn add_item(
        &mut self,
        path: &str,
        value: impl Into<Value>,
        guard: Option<String>,
    ) -> Result<(), RecipeError> {
        let element = Element {
            item: Item::new(value).with_guard(guard),
            comments: Vec::new(),
        };
        let id = match self.find(path) {
            Some(id) => id,
            None => {
                self.replace(path, Node::Sequence(Vec::new()))?;
                self.find(path).ok_or_else(|| RecipeError::NotAMapping(path.to_string()))?
            }
        };

        let node = &mut self.nodes[id];
        let updated = match std::mem::replace(node, Node::Empty) {
            Node::Sequence(mut elements) => {
                elements.push(element);
                Node::Sequence(elements)
            }
            Node::Empty => Node::Sequence(vec![element]),
            Node::Scalar(item) => {
                let first = Element {
                    item,
                    comments: Vec::new(),
                };
                Node::Sequence(vec![first, element])
            }
            other @ (Node::Mapping(_) | Node::Block(_)) => {
                *node = other;
                return Err(RecipeError::NotASequence(path.to_string()));
            }
        };
        *node = updated;
        Ok(())
    }

    /// Remove the entry at `path`, returning whether it existed.
    pub fn remove(&mut self, path: &str) -> bool {
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (self.find(parent), key),
            None => (Some(ROOT), path),
        };
        match parent.map(|id| &mut self.nodes[id]) {
            Some(Node::Mapping(entries)) => entries.shift_remove(key).is_some(),
            _ => false,
        }
    }

    /// Collapse a single unguarded item into a scalar.
    pub fn reduce(&mut self, path: &str) -> bool {
        match self.find(path) {
            Some(id) => self.reduce_node(id),
            None => false,
        }
    }

    /// [`Document::reduce`] every sequence outside `requirements`,
    /// `entry_points`, `test` and `extra`.
    pub fn reduce_all(&mut self) {
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            if let Node::Mapping(entries) = &self.nodes[id] {
                stack.extend(
                    entries
                        .iter()
                        .filter(|(key, _)| !KEEP_SEQUENCES.contains(&key.as_str()))
                        .map(|(_, entry)| entry.node),
                );
            } else {
                self.reduce_node(id);
            }
        }
    }

    pub fn render(&self) -> Result<String, RecipeError> {
        self.check_placeholders()?;
        writer::render(self)
    }

    pub fn variables(&self) -> impl Iterator<Item = &TemplateVariable> {
        self.preamble.iter().filter_map(|line| match line {
            PreambleLine::Variable(variable) => Some(variable),
            PreambleLine::Raw(_) => None,
        })
    }

    pub fn variable(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables().find(|variable| variable.name == name)
    }

    /// Update a quoted variable in place, or append it to the preamble.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        let quote = match self.variable(name).and_then(|variable| variable.quote) {
            Some(quote) if !value.contains(quote) => quote,
            _ => '"',
        };
        self.declare(TemplateVariable {
            name: name.to_string(),
            value: value.to_string(),
            quote: Some(quote),
        });
    }

    /// Declare a variable holding a raw Jinja expression.
    pub fn set_expression(&mut self, name: &str, expression: &str) {
        self.declare(TemplateVariable {
            name: name.to_string(),
            value: expression.to_string(),
            quote: None,
        });
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        let before = self.preamble.len();
        self.preamble
            .retain(|line| !matches!(line, PreambleLine::Variable(variable) if variable.name == name));
        self.preamble.len() != before
    }

    /// The text at `path`, resolving a `{{ variable }}` reference.
    pub fn variable_content(&self, path: &str) -> Option<String> {
        let text = self.get(path)?.value.to_string();
        match self.referenced_variable(&text) {
            Some(variable) => Some(variable.value.clone()),
            None => Some(text),
        }
    }

    /// Write `value` through the variable the item at `path` references, or
    /// set the item itself.
    pub fn set_variable_content(&mut self, path: &str, value: &str) -> Result<(), RecipeError> {
        let referenced = self
            .get(path)
            .and_then(|item| self.referenced_variable(&item.value.to_string()))
            .map(|variable| variable.name.clone());
        match referenced {
            Some(name) => {
                self.set_variable(&name, value);
                Ok(())
            }
            None => self.set(path, value),
        }
    }

    /// Lines appended after the last section, written as comments.
    pub fn add_trailer(&mut self, line: &str) {
        let line = line.trim_end();
        if line.starts_with('#') {
            self.trailer.push(line.to_string());
        } else {
            self.trailer.push(format!("# {line}").trim_end().to_string());
        }
    }

    fn referenced_variable(&self, text: &str) -> Option<&TemplateVariable> {
        let captures = REFERENCE.captures(text.trim())?;
        self.variable(&captures[1])
    }

    fn declare(&mut self, declared: TemplateVariable) {
        let existing = self.preamble.iter_mut().find_map(|line| match line {
            PreambleLine::Variable(variable) if variable.name == declared.name => Some(variable),
            _ => None,
        });
        match existing {
            Some(variable) => *variable = declared,
            None => self.preamble.push(PreambleLine::Variable(declared)),
        }
    }

    fn find(&self, path: &str) -> Option<NodeId> {
        path.split('.').try_fold(ROOT, |id, key| match &self.nodes[id] {
            Node::Mapping(entries) => entries.get(key).map(|entry| entry.node),
            _ => None,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Put `node` at `path`, keeping the comments of an existing entry.
    fn replace(&mut self, path: &str, node: Node) -> Result<(), RecipeError> {
        let keys: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = keys.split_last() else {
            return Err(RecipeError::NotAMapping(path.to_string()));
        };

        let mut id = ROOT;
        for (depth, key) in parents.iter().enumerate() {
            let child = match &self.nodes[id] {
                Node::Mapping(entries) => entries.get(*key).map(|entry| entry.node),
                _ => return Err(RecipeError::NotAMapping(keys[..depth].join("."))),
            };
            id = match child {
                Some(child) => {
                    if matches!(self.nodes[child], Node::Empty) {
                        self.nodes[child] = Node::mapping();
                    }
                    child
                }
                None => {
                    let child = self.push(Node::mapping());
                    self.insert(id, key, child);
                    child
                }
            };
        }

        let existing = match &self.nodes[id] {
            Node::Mapping(entries) => entries.get(*last).map(|entry| entry.node),
            _ => return Err(RecipeError::NotAMapping(parents.join("."))),
        };
        match existing {
            Some(existing) => self.nodes[existing] = node,
            None => {
                let child = self.push(node);
                self.insert(id, last, child);
            }
        }
        Ok(())
    }

    fn insert(&mut self, parent: NodeId, key: &str, child: NodeId) {
        if let Node::Mapping(entries) = &mut self.nodes[parent] {
            entries.insert(
                key.to_string(),
                Entry {
                    node: child,
                    comments: Vec::new(),
                    trailer: None,
                },
            );
        }
    }

    fn reduce_node(&mut self, id: NodeId) -> bool {
        let item = match &self.nodes[id] {
            Node::Sequence(elements) => match elements.as_slice() {
                [element] if element.item.guard.is_none() && !element.item.value.is_empty() => {
                    element.item.clone()
                }
                _ => return false,
            },
            _ => return false,
        };
        self.nodes[id] = Node::Scalar(item);
        true
    }

    fn check_placeholders(&self) -> Result<(), RecipeError> {
        let declared: Vec<&str> = self.variables().map(|variable| variable.name.as_str()).collect();
        let mut texts = Vec::new();
        writer::visible_texts(self, ROOT, &mut texts);
        for text in texts {
            for name in writer::placeholders(text) {
                if !declared.contains(&name) && !writer::BUILTINS.contains(&name) {
                    return Err(RecipeError::UndefinedVariable(name.to_string()));
                }
            }
        }
        Ok(())
    }
}
