//! Ordered YAML document tree
//!
//! `serde_yaml` parses the text; the result is converted into [`Mapping`],
//! which keeps key order, allows comments on entries and is emitted with the
//! four-space block style used by every `kittycad` config file. Head comments
//! on top-level keys are carried over from the source text so a rewrite does
//! not strip the explanations in a generated config.

use crate::error::{CliError, Result};
use serde_yaml::Value;

const INDENT: usize = 4;

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Flat scalar; YAML null reads as the empty string
    Scalar(String),
    /// Block sequence
    Sequence(Vec<Node>),
    /// Nested mapping
    Mapping(Mapping),
}

impl Node {
    /// Scalar node from anything string-like
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Scalar contents, `None` for collections
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// One key/value pair of a mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Key text
    pub key: String,
    /// Value node
    pub value: Node,
    /// Comment lines emitted above the key
    pub comment: Option<String>,
}

impl Entry {
    /// Entry without a comment
    pub fn new(key: impl Into<String>, value: Node) -> Self {
        Self {
            key: key.into(),
            value,
            comment: None,
        }
    }

    /// Attach a head comment
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Ordered mapping; keys keep insertion order and are never reordered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<Entry>,
}

impl Mapping {
    /// Empty mapping
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Keys in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Value of the first entry with `key`
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Mutable value of the first entry with `key`
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|e| e.key == key)
            .map(|e| &mut e.value)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Replace the value in place, or append a new entry last
    pub fn insert(&mut self, key: &str, value: Node) {
        if let Some(slot) = self.get_mut(key) {
            *slot = value;
        } else {
            self.entries.push(Entry::new(key, value));
        }
    }

    /// Append an entry as-is
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Insert an entry before every other entry
    pub fn prepend(&mut self, entry: Entry) {
        self.entries.insert(0, entry);
    }

    /// Remove every entry with `key`, returning the first removed value
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.key == key {
                if removed.is_none() {
                    removed = Some(entry.value);
                }
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        removed
    }

    fn set_comment(&mut self, key: &str, comment: String) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.comment = Some(comment);
        }
    }
}

impl FromIterator<Entry> for Mapping {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse a config document
///
/// Blank input yields an empty mapping. Any root other than a mapping is a
/// structural error.
pub fn parse(data: &str) -> Result<Mapping> {
    if data.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value =
        serde_yaml::from_str(data).map_err(|e| CliError::InvalidConfig(e.to_string()))?;

    let mut mapping = match untag(value) {
        Value::Null => return Ok(Mapping::new()),
        Value::Mapping(m) => mapping_from_yaml(m),
        _ => return Err(CliError::InvalidConfig("expected a top level map".to_string())),
    };

    for (key, comment) in head_comments(data) {
        mapping.set_comment(&key, comment);
    }

    Ok(mapping)
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn mapping_from_yaml(m: serde_yaml::Mapping) -> Mapping {
    m.into_iter()
        .map(|(k, v)| Entry::new(scalar_text(k), node_from_yaml(v)))
        .collect()
}

fn node_from_yaml(value: Value) -> Node {
    match untag(value) {
        Value::Mapping(m) => Node::Mapping(mapping_from_yaml(m)),
        Value::Sequence(items) => Node::Sequence(items.into_iter().map(node_from_yaml).collect()),
        other => Node::Scalar(scalar_text(other)),
    }
}

fn scalar_text(value: Value) -> String {
    match untag(value) {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Comment blocks sitting directly above top-level keys
fn head_comments(data: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in data.lines() {
        if let Some(text) = line.strip_prefix('#') {
            pending.push(text.strip_prefix(' ').unwrap_or(text));
            continue;
        }
        if line.trim().is_empty() || line.starts_with(char::is_whitespace) || line == "---" {
            if !line.starts_with(char::is_whitespace) {
                pending.clear();
            }
            continue;
        }
        if !pending.is_empty() {
            if let Some(key) = top_level_key(line) {
                found.push((key, pending.join("\n")));
            }
        }
        pending.clear();
    }

    found
}

/// Key of a top-level `key: value` or `key:` line
///
/// A colon only ends the key when followed by whitespace or the end of the
/// line, so `localhost:8888:` yields `localhost:8888`.
fn top_level_key(line: &str) -> Option<String> {
    if let Ok(Value::Mapping(map)) = serde_yaml::from_str::<Value>(line) {
        if let (1, Some(key)) = (map.len(), map.keys().next()) {
            return Some(scalar_text(key.clone()));
        }
    }
    let line = line.trim_end();
    let raw = match line.find(": ") {
        Some(i) => &line[..i],
        None => line.strip_suffix(':')?,
    };
    serde_yaml::from_str::<Value>(raw).ok().map(scalar_text)
}

/// Render a mapping as a YAML document; an empty mapping renders as ""
pub fn to_yaml(mapping: &Mapping) -> String {
    let mut out = String::new();
    write_mapping(&mut out, mapping, 0);
    out
}

fn write_mapping(out: &mut String, mapping: &Mapping, depth: usize) {
    let pad = " ".repeat(depth * INDENT);
    for entry in mapping.entries() {
        if let Some(comment) = &entry.comment {
            for line in comment.lines() {
                out.push_str(&pad);
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&pad);
        out.push_str(&quote(&entry.key));
        out.push(':');
        write_value(out, &entry.value, depth);
    }
}

fn write_value(out: &mut String, value: &Node, depth: usize) {
    match value {
        Node::Scalar(s) if s.is_empty() => out.push('\n'),
        Node::Scalar(s) => {
            out.push(' ');
            out.push_str(&quote(s));
            out.push('\n');
        }
        Node::Mapping(m) if m.is_empty() => out.push_str(" {}\n"),
        Node::Mapping(m) => {
            out.push('\n');
            write_mapping(out, m, depth + 1);
        }
        Node::Sequence(items) if items.is_empty() => out.push_str(" []\n"),
        Node::Sequence(items) => {
            out.push('\n');
            write_sequence(out, items, depth + 1);
        }
    }
}

fn write_sequence(out: &mut String, items: &[Node], depth: usize) {
    let pad = " ".repeat(depth * INDENT);
    for item in items {
        out.push_str(&pad);
        out.push('-');
        match item {
            Node::Scalar(_) => write_value(out, item, depth),
            Node::Mapping(m) if m.is_empty() => out.push_str(" {}\n"),
            Node::Sequence(v) if v.is_empty() => out.push_str(" []\n"),
            Node::Mapping(m) => {
                out.push('\n');
                write_mapping(out, m, depth + 1);
            }
            Node::Sequence(v) => {
                out.push('\n');
                write_sequence(out, v, depth + 1);
            }
        }
    }
}

/// Quote a scalar only when the plain form would not read back verbatim
fn quote(s: &str) -> String {
    if is_plain_safe(s) {
        return s.to_string();
    }
    if s.chars().any(char::is_control) {
        return double_quoted(s);
    }
    format!("'{}'", s.replace('\'', "''"))
}

fn is_plain_safe(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if s.trim() != s || s.chars().any(char::is_control) {
        return false;
    }
    if "!&*-?{}[]|>'\"%@`#,:".contains(first) {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref parsed)) if parsed == s)
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
