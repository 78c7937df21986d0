//! Node framework
//!
//!     A grammar node claims a prefix of the token list, records what it matched, and
//!     hands the rest on. Nodes with children thread that remainder through their
//!     declared child kinds in order, so the remainder behaves like one cursor moving
//!     left to right through the line. Nothing backtracks and nothing looks at tokens
//!     an earlier node already claimed.
//!
//! Optional Nodes
//!
//!     When a node receives no tokens its own match step is skipped and its raw text
//!     stays empty. Optional nodes accept that silently, required nodes fail with
//!     [ParseError::RequiredTokenMissing]. Children are still built from the (empty)
//!     remainder, so optionality propagates down the tree.
//!
//! Name-Keyed Access
//!
//!     Every node answers `get`, `set` and `delete` by name. Resolution always goes:
//!
//!         1. Own fields (including `raw_text`)
//!         2. Children, keyed by their kind name
//!         3. The open attribute map, for nodes that have one
//!
//!     A name found at an earlier tier shadows the same name further down. Writes never
//!     create new names.

use super::error::{FieldError, FieldResult, ParseError, ParseResult};
use super::grammar::{Node, NodeKind, NodeRef};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Address family used to normalize `default` and bare addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    #[default]
    Inet,
    Inet6,
}

impl Family {
    /// The zero-length prefix that `default` stands for
    pub fn default_prefix(self) -> &'static str {
        match self {
            Family::Inet => "0.0.0.0/0",
            Family::Inet6 => "::/0",
        }
    }
}

/// Options shared by every node built during one parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether `to_text` includes descendants or only the node's own match
    pub reconstruct_children: bool,
    pub family: Family,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            reconstruct_children: true,
            family: Family::Inet,
        }
    }
}

/// State every grammar node carries: what it matched and how it prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCore {
    raw_text: String,
    reconstructs_children: bool,
}

impl NodeCore {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            raw_text: String::new(),
            reconstructs_children: options.reconstruct_children,
        }
    }

    /// The tokens this node itself matched, joined with single spaces
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn reconstructs_children(&self) -> bool {
        self.reconstructs_children
    }

    /// Records the consumed prefix. Only called from a node's match step.
    pub(crate) fn record(&mut self, consumed: &[String]) {
        self.raw_text = consumed.join(" ");
    }
}

/// Read view of a named field
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    Text(Cow<'a, str>),
    /// An optional field whose clause was absent (or was deleted)
    Unset,
    Node(NodeRef<'a>),
}

impl<'a> Field<'a> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(text) => Some(&**text),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'a>> {
        match self {
            Field::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }
}

/// Value written through `set`
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Node(Node),
}

impl FieldValue {
    /// Unwraps a text value, reporting a mismatch against `node`/`name` otherwise
    pub fn into_text(self, node: &'static str, name: &str) -> FieldResult<String> {
        match self {
            FieldValue::Text(text) => Ok(text),
            FieldValue::Node(_) => Err(FieldError::FieldTypeMismatch {
                node,
                name: name.to_string(),
                expected: "text",
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Node> for FieldValue {
    fn from(value: Node) -> Self {
        FieldValue::Node(value)
    }
}

/// Common interface for every grammar node.
///
/// Implementors provide the match step and their own field table; the provided
/// methods implement construction order, tiered name resolution, and text
/// reconstruction on top.
pub trait GrammarNode {
    /// Name this node's kind is keyed by in its parent
    const NAME: &'static str;
    /// Optional nodes may match nothing at all
    const OPTIONAL: bool;
    /// Human description of what the match step needs, used in errors
    const EXPECTED: &'static str;

    /// An unmatched node, ready for [construct]
    fn empty(options: &ParseOptions) -> Self
    where
        Self: Sized;

    fn core(&self) -> &NodeCore;

    /// Consumes a type-specific prefix of `tokens` and returns the remainder
    fn match_tokens<'t>(&mut self, tokens: &'t [String]) -> ParseResult<&'t [String]>;

    /// Builds declared children from the remainder; leaf nodes keep the default
    fn add_children<'t>(
        &mut self,
        remainder: &'t [String],
        _options: &ParseOptions,
    ) -> ParseResult<&'t [String]> {
        Ok(remainder)
    }

    fn own_field(&self, name: &str) -> Option<Field<'_>>;

    /// `None` when `name` is not an own field
    fn set_own_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>>;

    /// `None` when `name` is not an own field
    fn delete_own_field(&mut self, name: &str) -> Option<FieldResult<()>>;

    /// Children in declaration order
    fn children(&self) -> Vec<NodeRef<'_>> {
        Vec::new()
    }

    fn set_child(&mut self, _name: &str, _value: FieldValue) -> Option<FieldResult<()>> {
        None
    }

    fn delete_child(&mut self, _name: &str) -> Option<FieldResult<()>> {
        None
    }

    fn open_field(&self, _name: &str) -> Option<Field<'_>> {
        None
    }

    fn set_open_field(&mut self, _name: &str, _value: FieldValue) -> Option<FieldResult<()>> {
        None
    }

    fn delete_open_field(&mut self, _name: &str) -> Option<FieldResult<()>> {
        None
    }

    fn raw_text(&self) -> &str {
        self.core().raw_text()
    }

    fn child(&self, name: &str) -> Option<NodeRef<'_>> {
        self.children()
            .into_iter()
            .find(|child| child.kind().name() == name)
    }

    fn get(&self, name: &str) -> FieldResult<Field<'_>> {
        if name == "raw_text" {
            return Ok(Field::Text(Cow::Borrowed(self.raw_text())));
        }
        if let Some(field) = self.own_field(name) {
            return Ok(field);
        }
        if let Some(child) = self.child(name) {
            return Ok(Field::Node(child));
        }
        self.open_field(name).ok_or_else(|| no_such_field::<Self>(name))
    }

    fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> FieldResult<()>
    where
        Self: Sized,
    {
        if name == "raw_text" {
            return Err(read_only::<Self>(name));
        }
        let value = value.into();
        if let Some(result) = self.set_own_field(name, value.clone()) {
            return result;
        }
        if let Some(result) = self.set_child(name, value.clone()) {
            return result;
        }
        self.set_open_field(name, value)
            .unwrap_or_else(|| Err(no_such_field::<Self>(name)))
    }

    fn delete(&mut self, name: &str) -> FieldResult<()>
    where
        Self: Sized,
    {
        if name == "raw_text" {
            return Err(read_only::<Self>(name));
        }
        if let Some(result) = self.delete_own_field(name) {
            return result;
        }
        if let Some(result) = self.delete_child(name) {
            return result;
        }
        self.delete_open_field(name)
            .unwrap_or_else(|| Err(no_such_field::<Self>(name)))
    }

    /// Reconstructs the text this node (and, when enabled, its subtree) matched
    fn to_text(&self) -> String {
        let core = self.core();
        if !core.reconstructs_children() {
            return core.raw_text().to_string();
        }

        let mut parts = Vec::new();
        if !core.raw_text().is_empty() {
            parts.push(core.raw_text().to_string());
        }
        parts.extend(
            self.children()
                .iter()
                .map(|child| child.to_text())
                .filter(|text| !text.is_empty()),
        );
        parts.join(" ")
    }
}

/// Construct: matches `tokens` (unless empty), then builds children from what is left.
///
/// Returns the node and the remainder nobody in its subtree claimed.
pub fn construct<'t, N: GrammarNode>(
    tokens: &'t [String],
    options: &ParseOptions,
) -> ParseResult<(N, &'t [String])> {
    let mut node = N::empty(options);

    let remainder = if tokens.is_empty() {
        if !N::OPTIONAL {
            return Err(ParseError::missing(N::NAME, N::EXPECTED, None));
        }
        tokens
    } else {
        node.match_tokens(tokens)?
    };

    let remainder = node.add_children(remainder, options)?;
    Ok((node, remainder))
}

/// AddChildren: builds each declared kind in order, threading the remainder through.
pub fn thread_children<'t>(
    kinds: &[NodeKind],
    remainder: &'t [String],
    options: &ParseOptions,
) -> ParseResult<(Vec<Node>, &'t [String])> {
    let mut children = Vec::with_capacity(kinds.len());
    let mut data = remainder;

    for kind in kinds {
        let (child, rest) = Node::construct(*kind, data, options)?;
        children.push(child);
        data = rest;
    }

    Ok((children, data))
}

pub(crate) fn no_such_field<N: GrammarNode + ?Sized>(name: &str) -> FieldError {
    FieldError::NoSuchField {
        node: N::NAME,
        name: name.to_string(),
    }
}

pub(crate) fn read_only<N: GrammarNode + ?Sized>(name: &str) -> FieldError {
    FieldError::ReadOnlyField {
        node: N::NAME,
        name: name.to_string(),
    }
}

pub(crate) fn required<N: GrammarNode + ?Sized>(name: &str) -> FieldError {
    FieldError::RequiredField {
        node: N::NAME,
        name: name.to_string(),
    }
}

pub(crate) fn mismatch<N: GrammarNode + ?Sized>(name: &str, expected: &'static str) -> FieldError {
    FieldError::FieldTypeMismatch {
        node: N::NAME,
        name: name.to_string(),
        expected,
    }
}

/// Helper for optional text fields: present values read as text, absent as unset
pub(crate) fn optional_text(value: &Option<String>) -> Field<'_> {
    match value {
        Some(text) => Field::Text(Cow::Borrowed(text)),
        None => Field::Unset,
    }
}
