//! Loader for the recipe subset of YAML.
//!
//! Supported: nested mappings, sequences of scalars, quoted and plain
//! scalars, block scalars, and trailing `# [guard]` or `# comment` text.
//! Comment lines and stray `{% %}` statements attach to the entry that follows
//! them.

use std::mem;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::recipe::node::{Block, Element, Entry, Item, Node, NodeId, Value};
use crate::recipe::{PreambleLine, RecipeError, TemplateVariable};

static KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*:(?:\s+(.*?))?\s*$").unwrap());

static SET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{%-?\s*set\s+([A-Za-z_]\w*)\s*=\s*(.*?)\s*-?%\}$").unwrap());

pub(crate) struct Loaded {
    pub(crate) nodes: Vec<Node>,
    pub(crate) preamble: Vec<PreambleLine>,
    pub(crate) trailer: Vec<String>,
}

struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
    raw: &'a str,
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Comments and stray template statements, attached to the next entry.
    fn is_attachable(&self) -> bool {
        self.text.starts_with('#') || self.text.starts_with("{%")
    }

    fn is_content(&self) -> bool {
        !self.is_blank() && !self.is_attachable()
    }

    fn is_item(&self) -> bool {
        self.text == "-" || self.text.starts_with("- ")
    }
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    nodes: Vec<Node>,
    pending: Vec<String>,
}

pub(crate) fn load(text: &str) -> Result<Loaded, RecipeError> {
    let lines: Vec<Line<'_>> = text
        .lines()
        .enumerate()
        .map(|(index, raw)| {
            let raw = raw.trim_end();
            let text = raw.trim_start();
            Line {
                number: index + 1,
                indent: raw.len() - text.len(),
                text,
                raw,
            }
        })
        .collect();

    let body_start = lines
        .iter()
        .position(|line| line.indent == 0 && KEY.is_match(line.text))
        .unwrap_or(lines.len());

    let preamble = lines[..body_start]
        .iter()
        .filter(|line| !line.is_blank())
        .map(|line| match parse_set(line.text) {
            Some(variable) => PreambleLine::Variable(variable),
            None => PreambleLine::Raw(line.raw.to_string()),
        })
        .collect();

    let mut parser = Parser {
        lines,
        pos: body_start,
        nodes: vec![Node::mapping()],
        pending: Vec::new(),
    };
    let root = parser.parse_mapping(0)?;
    parser.advance();
    parser.nodes.swap(0, root);
    let trailer = mem::take(&mut parser.pending);

    Ok(Loaded {
        nodes: parser.nodes,
        preamble,
        trailer,
    })
}

/// Read a `{% set name = value %}` statement.
pub(crate) fn parse_set(text: &str) -> Option<TemplateVariable> {
    let captures = SET.captures(text)?;
    let name = captures.get(1)?.as_str().to_string();
    let expression = captures.get(2)?.as_str();
    let quoted = ['"', '\''].into_iter().find(|quote| {
        expression.len() >= 2
            && expression.starts_with(*quote)
            && expression.ends_with(*quote)
            && !expression[1..expression.len() - 1].contains(*quote)
    });
    Some(match quoted {
        Some(quote) => TemplateVariable {
            name,
            value: expression[1..expression.len() - 1].to_string(),
            quote: Some(quote),
        },
        None => TemplateVariable {
            name,
            value: expression.to_string(),
            quote: None,
        },
    })
}

impl<'a> Parser<'a> {
    /// The next content line, without consuming anything.
    fn peek(&self) -> Option<&Line<'a>> {
        self.lines[self.pos..].iter().find(|line| line.is_content())
    }

    /// Move to the next content line, collecting attachable lines on the way.
    fn advance(&mut self) -> Option<usize> {
        while let Some(line) = self.lines.get(self.pos) {
            if line.is_content() {
                return Some(self.pos);
            }
            if line.is_attachable() {
                self.pending.push(line.raw.to_string());
            }
            self.pos += 1;
        }
        None
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<NodeId, RecipeError> {
        let mut entries: IndexMap<String, Entry> = IndexMap::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent || line.is_item() {
                return Err(RecipeError::UnexpectedIndent(line.number));
            }
            let number = line.number;
            let Some(captures) = KEY.captures(line.text) else {
                return Err(RecipeError::Unsupported {
                    line: number,
                    reason: "expected a `key:` line",
                });
            };
            let key = captures[1].to_string();
            let rest = captures.get(2).map_or("", |rest| rest.as_str());
            if entries.contains_key(&key) {
                return Err(RecipeError::DuplicateKey { key, line: number });
            }

            self.advance();
            self.pos += 1;
            let comments = mem::take(&mut self.pending);

            let (node, trailer) = if rest.is_empty() || rest.starts_with('#') {
                let trailer = rest.strip_prefix('#').map(|text| text.trim().to_string());
                (self.parse_nested(indent)?, trailer)
            } else if rest.starts_with('|') || rest.starts_with('>') {
                let block = self.parse_block(indent, rest);
                (self.push(Node::Block(block)), None)
            } else {
                let item = parse_item(rest, number)?;
                (self.push(Node::Scalar(item)), None)
            };

            entries.insert(
                key,
                Entry {
                    node,
                    comments,
                    trailer,
                },
            );
        }

        Ok(self.push(Node::Mapping(entries)))
    }

    /// The value of a `key:` line whose content starts on the next line.
    fn parse_nested(&mut self, indent: usize) -> Result<NodeId, RecipeError> {
        let Some(next) = self.peek() else {
            return Ok(self.push(Node::Empty));
        };
        let next_indent = next.indent;
        if next.is_item() && next_indent >= indent {
            self.parse_sequence(next_indent)
        } else if next_indent > indent {
            self.parse_mapping(next_indent)
        } else {
            Ok(self.push(Node::Empty))
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<NodeId, RecipeError> {
        let mut elements = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent || (line.indent == indent && !line.is_item()) {
                break;
            }
            if line.indent > indent {
                return Err(RecipeError::UnexpectedIndent(line.number));
            }
            let number = line.number;
            let content = line.text.strip_prefix('-').unwrap_or_default().trim_start();
            if content.is_empty() || content.starts_with("- ") {
                return Err(RecipeError::Unsupported {
                    line: number,
                    reason: "nested sequences are not supported",
                });
            }
            if KEY.is_match(content) {
                return Err(RecipeError::Unsupported {
                    line: number,
                    reason: "sequences of mappings are not supported",
                });
            }
            let item = parse_item(content, number)?;

            self.advance();
            self.pos += 1;
            elements.push(Element {
                item,
                comments: mem::take(&mut self.pending),
            });
        }

        Ok(self.push(Node::Sequence(elements)))
    }

    /// Collect the lines of a block scalar opened on a line at `indent`.
    fn parse_block(&mut self, indent: usize, indicator: &str) -> Block {
        let mut raw_lines = Vec::new();
        while let Some(line) = self.lines.get(self.pos) {
            if !line.is_blank() && line.indent <= indent {
                break;
            }
            raw_lines.push(line.raw);
            self.pos += 1;
        }
        while raw_lines.last().is_some_and(|line| line.trim().is_empty()) {
            raw_lines.pop();
            self.pos -= 1;
        }

        let block_indent = raw_lines
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.len() - line.trim_start().len())
            .min()
            .unwrap_or(indent + 2);
        Block {
            indicator: indicator.trim().to_string(),
            lines: raw_lines
                .into_iter()
                .map(|line| line.get(block_indent..).unwrap_or_default().to_string())
                .collect(),
        }
    }
}

/// Read a scalar with its optional trailing `# [guard] comment`.
pub(crate) fn parse_item(text: &str, line: usize) -> Result<Item, RecipeError> {
    let mut item = read_item(text, line)?;
    item.source = Some(text.trim_end().to_string());
    Ok(item)
}

fn read_item(text: &str, line: usize) -> Result<Item, RecipeError> {
    let (value, rest) = match text.chars().next() {
        Some('"') => {
            let (value, rest) = double_quoted(&text[1..]).ok_or(RecipeError::Unsupported {
                line,
                reason: "unterminated double-quoted scalar",
            })?;
            (Value::Text(value), rest)
        }
        Some('\'') => {
            let (value, rest) = single_quoted(&text[1..]).ok_or(RecipeError::Unsupported {
                line,
                reason: "unterminated single-quoted scalar",
            })?;
            (Value::Text(value), rest)
        }
        _ => {
            let split = text.find(" #").unwrap_or(text.len());
            let (value, rest) = text.split_at(split);
            (Value::from_plain(value.trim_end()), rest)
        }
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Item::new(value));
    }
    let Some(comment) = rest.strip_prefix('#') else {
        return Err(RecipeError::Unsupported {
            line,
            reason: "unexpected text after a quoted scalar",
        });
    };
    let comment = comment.trim();

    let (guard, comment) = match comment
        .strip_prefix('[')
        .and_then(|inner| inner.split_once(']'))
    {
        Some((guard, after)) => (Some(guard.trim().to_string()), after.trim()),
        None => (None, comment),
    };
    Ok(Item::new(value)
        .with_guard(guard)
        .with_comment(Some(comment.to_string())))
}

fn double_quoted(text: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = text.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Some((value, &text[index + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                other => value.push(other),
            },
            other => value.push(other),
        }
    }
    None
}

fn single_quoted(text: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if c == '\'' {
            if chars.peek().is_some_and(|(_, next)| *next == '\'') {
                chars.next();
                value.push('\'');
            } else {
                return Some((value, &text[index + 1..]));
            }
        } else {
            value.push(c);
        }
    }
    None
}
