//! Route grammar
//!
//!     One route line is a fixed sequence of clauses under a [Route] root:
//!
//!         [type] <destination> [via [family] <addr>] [dev <ifname>] [<keyword> <value>]...
//!
//!     - `destination` ([DestinationSpec], required): `default` or `addr[/len]`,
//!       optionally preceded by a route type such as `unreachable` or `local`.
//!     - `info` ([InfoSpec], optional): `via` and `dev` clauses, in either order, each
//!       at most once.
//!     - `attributes` ([AttributeTail], optional): everything else, stored as ordered
//!       keyword/value pairs. The vocabulary is open; unknown keywords are kept, not
//!       rejected.
//!
//!     The node kinds form a closed set ([NodeKind]). The root declares its children
//!     in [ROUTE_CHILDREN] and the framework threads the token remainder through them.

use super::error::{FieldResult, ParseError, ParseResult};
use super::node::{
    construct, mismatch, optional_text, read_only, required, thread_children, Family, Field,
    FieldValue, GrammarNode, NodeCore, ParseOptions,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Keyword standing for the zero-length prefix
pub const DEFAULT_KEYWORD: &str = "default";

/// Route types `ip` prints in front of the destination
pub const ROUTE_TYPES: &[&str] = &[
    "unicast",
    "local",
    "broadcast",
    "multicast",
    "throw",
    "unreachable",
    "prohibit",
    "blackhole",
    "nat",
    "anycast",
];

/// Attribute keywords that never take a value
pub const FLAG_KEYWORDS: &[&str] = &[
    "onlink",
    "linkdown",
    "dead",
    "pervasive",
    "offload",
    "trap",
    "notify",
    "rt_offload",
    "rt_trap",
    "rt_offload_failed",
];

/// Shape of a destination token: hex digits with at least one `.` or `:`, an
/// optional `%zone`, then an optional length. Keywords like `via` never match.
static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<address>[0-9A-Fa-f]*[.:][0-9A-Fa-f.:]*(?:%[^/\s]+)?)(?:/(?P<len>\d{1,3}))?$",
    )
    .unwrap()
});

/// The order the root hands its remainder to children
pub const ROUTE_CHILDREN: [NodeKind; 3] =
    [NodeKind::Destination, NodeKind::Info, NodeKind::Attributes];

// ============================================================================
// Node kinds
// ============================================================================

/// Closed set of grammar node kinds below the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Destination,
    Info,
    Attributes,
}

impl NodeKind {
    /// The key a parent uses for a child of this kind
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Destination => DestinationSpec::NAME,
            NodeKind::Info => InfoSpec::NAME,
            NodeKind::Attributes => AttributeTail::NAME,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned grammar node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Destination(DestinationSpec),
    Info(InfoSpec),
    Attributes(AttributeTail),
}

impl Node {
    /// Builds a node of `kind` from `tokens`, returning the unconsumed remainder
    pub fn construct<'t>(
        kind: NodeKind,
        tokens: &'t [String],
        options: &ParseOptions,
    ) -> ParseResult<(Node, &'t [String])> {
        Ok(match kind {
            NodeKind::Destination => {
                let (node, rest) = construct::<DestinationSpec>(tokens, options)?;
                (Node::Destination(node), rest)
            }
            NodeKind::Info => {
                let (node, rest) = construct::<InfoSpec>(tokens, options)?;
                (Node::Info(node), rest)
            }
            NodeKind::Attributes => {
                let (node, rest) = construct::<AttributeTail>(tokens, options)?;
                (Node::Attributes(node), rest)
            }
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.as_node_ref().kind()
    }

    pub fn as_node_ref(&self) -> NodeRef<'_> {
        match self {
            Node::Destination(node) => NodeRef::Destination(node),
            Node::Info(node) => NodeRef::Info(node),
            Node::Attributes(node) => NodeRef::Attributes(node),
        }
    }

    pub fn to_text(&self) -> String {
        self.as_node_ref().to_text()
    }
}

/// A borrowed grammar node, as handed out by `get` and `children`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Destination(&'a DestinationSpec),
    Info(&'a InfoSpec),
    Attributes(&'a AttributeTail),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Destination(_) => NodeKind::Destination,
            NodeRef::Info(_) => NodeKind::Info,
            NodeRef::Attributes(_) => NodeKind::Attributes,
        }
    }

    pub fn get(&self, name: &str) -> FieldResult<Field<'a>> {
        match *self {
            NodeRef::Destination(node) => node.get(name),
            NodeRef::Info(node) => node.get(name),
            NodeRef::Attributes(node) => node.get(name),
        }
    }

    pub fn raw_text(&self) -> &'a str {
        match *self {
            NodeRef::Destination(node) => node.core.raw_text(),
            NodeRef::Info(node) => node.core.raw_text(),
            NodeRef::Attributes(node) => node.core.raw_text(),
        }
    }

    pub fn to_text(&self) -> String {
        match *self {
            NodeRef::Destination(node) => node.to_text(),
            NodeRef::Info(node) => node.to_text(),
            NodeRef::Attributes(node) => node.to_text(),
        }
    }
}

// ============================================================================
// Destination
// ============================================================================

/// `[type] default|addr[/len]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    core: NodeCore,
    family: Family,
    route_type: Option<String>,
    address: String,
    prefix_len: Option<u8>,
}

impl DestinationSpec {
    pub fn route_type(&self) -> Option<&str> {
        self.route_type.as_deref()
    }

    /// The address as written, without any `/len` (`default` stays `default`)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The explicit prefix length, if the source had one
    pub fn prefix_len(&self) -> Option<u8> {
        self.prefix_len
    }

    pub fn is_default(&self) -> bool {
        self.address == DEFAULT_KEYWORD
    }

    /// Normalized `addr/len`: `default` becomes the family's zero-length prefix and a
    /// bare address gets a full-length mask. Empty when nothing was matched.
    pub fn prefix(&self) -> String {
        if self.address.is_empty() {
            return String::new();
        }
        if self.is_default() {
            return self.family.default_prefix().to_string();
        }
        let len = self
            .prefix_len
            .unwrap_or_else(|| full_length(&self.address));
        format!("{}/{}", self.address, len)
    }
}

fn full_length(address: &str) -> u8 {
    if address.contains(':') {
        128
    } else {
        32
    }
}

impl GrammarNode for DestinationSpec {
    const NAME: &'static str = "destination";
    const OPTIONAL: bool = false;
    const EXPECTED: &'static str = "an address or `default`";

    fn empty(options: &ParseOptions) -> Self {
        DestinationSpec {
            core: NodeCore::new(options),
            family: options.family,
            route_type: None,
            address: String::new(),
            prefix_len: None,
        }
    }

    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn match_tokens<'t>(&mut self, tokens: &'t [String]) -> ParseResult<&'t [String]> {
        let mut consumed = 0;

        if let Some(first) = tokens.first() {
            if ROUTE_TYPES.contains(&first.as_str()) {
                self.route_type = Some(first.clone());
                consumed += 1;
            }
        }

        let token = tokens
            .get(consumed)
            .ok_or_else(|| ParseError::missing(Self::NAME, Self::EXPECTED, None))?;

        if token == DEFAULT_KEYWORD {
            self.address = token.clone();
        } else {
            let captures = ADDRESS_PATTERN
                .captures(token)
                .ok_or_else(|| ParseError::missing(Self::NAME, Self::EXPECTED, Some(token)))?;
            self.address = captures["address"].to_string();
            if let Some(len) = captures.name("len") {
                let len = len
                    .as_str()
                    .parse::<u8>()
                    .map_err(|_| ParseError::missing(Self::NAME, Self::EXPECTED, Some(token)))?;
                self.prefix_len = Some(len);
            }
        }
        consumed += 1;

        self.core.record(&tokens[..consumed]);
        Ok(&tokens[consumed..])
    }

    fn own_field(&self, name: &str) -> Option<Field<'_>> {
        Some(match name {
            "type" => optional_text(&self.route_type),
            "address" => Field::Text(Cow::Borrowed(&self.address)),
            "prefix_len" => match self.prefix_len {
                Some(len) => Field::Text(Cow::Owned(len.to_string())),
                None => Field::Unset,
            },
            "prefix" => Field::Text(Cow::Owned(self.prefix())),
            _ => return None,
        })
    }

    fn set_own_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        Some(match name {
            "type" => value
                .into_text(Self::NAME, name)
                .map(|text| self.route_type = Some(text)),
            "address" => value
                .into_text(Self::NAME, name)
                .map(|text| self.address = text),
            "prefix_len" => value.into_text(Self::NAME, name).and_then(|text| {
                let len = text
                    .parse::<u8>()
                    .map_err(|_| mismatch::<Self>(name, "a prefix length"))?;
                self.prefix_len = Some(len);
                Ok(())
            }),
            "prefix" => Err(read_only::<Self>(name)),
            _ => return None,
        })
    }

    fn delete_own_field(&mut self, name: &str) -> Option<FieldResult<()>> {
        Some(match name {
            "type" => {
                self.route_type = None;
                Ok(())
            }
            "prefix_len" => {
                self.prefix_len = None;
                Ok(())
            }
            "address" => Err(required::<Self>(name)),
            "prefix" => Err(read_only::<Self>(name)),
            _ => return None,
        })
    }
}

// ============================================================================
// Next hop and device
// ============================================================================

/// `[via [inet|inet6] <addr>] [dev <ifname>]`, in either order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSpec {
    core: NodeCore,
    via: Option<String>,
    via_family: Option<String>,
    dev: Option<String>,
}

impl InfoSpec {
    pub fn via(&self) -> Option<&str> {
        self.via.as_deref()
    }

    /// Address family written between `via` and the address (`via inet6 fe80::1`)
    pub fn via_family(&self) -> Option<&str> {
        self.via_family.as_deref()
    }

    pub fn dev(&self) -> Option<&str> {
        self.dev.as_deref()
    }

    pub(crate) fn via_mut(&mut self) -> &mut Option<String> {
        &mut self.via
    }

    pub(crate) fn dev_mut(&mut self) -> &mut Option<String> {
        &mut self.dev
    }
}

impl GrammarNode for InfoSpec {
    const NAME: &'static str = "info";
    const OPTIONAL: bool = true;
    const EXPECTED: &'static str = "`via` or `dev` clause";

    fn empty(options: &ParseOptions) -> Self {
        InfoSpec {
            core: NodeCore::new(options),
            via: None,
            via_family: None,
            dev: None,
        }
    }

    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn match_tokens<'t>(&mut self, tokens: &'t [String]) -> ParseResult<&'t [String]> {
        let mut consumed = 0;

        loop {
            match tokens.get(consumed).map(String::as_str) {
                Some("via") if self.via.is_none() => {
                    consumed += 1;
                    let mut value = tokens.get(consumed);
                    if let Some(family) = value.filter(|v| *v == "inet" || *v == "inet6") {
                        if let Some(address) = tokens.get(consumed + 1) {
                            self.via_family = Some(family.clone());
                            consumed += 1;
                            value = Some(address);
                        }
                    }
                    let address = value.ok_or_else(|| {
                        ParseError::missing(Self::NAME, "next-hop address after `via`", None)
                    })?;
                    self.via = Some(address.clone());
                    consumed += 1;
                }
                Some("dev") if self.dev.is_none() => {
                    consumed += 1;
                    let device = tokens.get(consumed).ok_or_else(|| {
                        ParseError::missing(Self::NAME, "interface name after `dev`", None)
                    })?;
                    self.dev = Some(device.clone());
                    consumed += 1;
                }
                _ => break,
            }
        }

        self.core.record(&tokens[..consumed]);
        Ok(&tokens[consumed..])
    }

    fn own_field(&self, name: &str) -> Option<Field<'_>> {
        Some(match name {
            "via" => optional_text(&self.via),
            "via_family" => optional_text(&self.via_family),
            "dev" => optional_text(&self.dev),
            _ => return None,
        })
    }

    fn set_own_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        let slot = match name {
            "via" => &mut self.via,
            "via_family" => &mut self.via_family,
            "dev" => &mut self.dev,
            _ => return None,
        };
        Some(
            value
                .into_text(Self::NAME, name)
                .map(|text| *slot = Some(text)),
        )
    }

    fn delete_own_field(&mut self, name: &str) -> Option<FieldResult<()>> {
        let slot = match name {
            "via" => &mut self.via,
            "via_family" => &mut self.via_family,
            "dev" => &mut self.dev,
            _ => return None,
        };
        *slot = None;
        Some(Ok(()))
    }
}

// ============================================================================
// Attribute tail
// ============================================================================

/// One trailing `keyword value` pair. Flags have no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub keyword: String,
    pub value: Option<String>,
}

/// Ordered, open-ended `keyword value` pairs after the info clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTail {
    core: NodeCore,
    entries: Vec<Attribute>,
}

impl AttributeTail {
    /// Value of the first attribute named `keyword`; flags read as `""`
    pub fn get_attribute(&self, keyword: &str) -> Option<&str> {
        self.find(keyword)
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    pub fn has_flag(&self, keyword: &str) -> bool {
        self.find(keyword).is_some_and(|attr| attr.value.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, keyword: &str) -> Option<&Attribute> {
        self.entries.iter().find(|attr| attr.keyword == keyword)
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        self.entries.iter().position(|attr| attr.keyword == keyword)
    }
}

impl GrammarNode for AttributeTail {
    const NAME: &'static str = "attributes";
    const OPTIONAL: bool = true;
    const EXPECTED: &'static str = "`keyword value` pairs";

    fn empty(options: &ParseOptions) -> Self {
        AttributeTail {
            core: NodeCore::new(options),
            entries: Vec::new(),
        }
    }

    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn match_tokens<'t>(&mut self, tokens: &'t [String]) -> ParseResult<&'t [String]> {
        let mut rest = tokens;

        while let Some((keyword, after)) = rest.split_first() {
            let (value, after) = match after {
                _ if FLAG_KEYWORDS.contains(&keyword.as_str()) => (None, after),
                // Locked metrics print as `mtu lock 1400`
                [lock, number, tail @ ..] if lock == "lock" => {
                    (Some(format!("{} {}", lock, number)), tail)
                }
                [value, tail @ ..] => (Some(value.clone()), tail),
                // A trailing keyword with nothing after it is kept as a flag
                [] => (None, after),
            };
            self.entries.push(Attribute {
                keyword: keyword.clone(),
                value,
            });
            rest = after;
        }

        self.core.record(tokens);
        Ok(rest)
    }

    fn own_field(&self, _name: &str) -> Option<Field<'_>> {
        None
    }

    fn set_own_field(&mut self, _name: &str, _value: FieldValue) -> Option<FieldResult<()>> {
        None
    }

    fn delete_own_field(&mut self, _name: &str) -> Option<FieldResult<()>> {
        None
    }

    fn open_field(&self, name: &str) -> Option<Field<'_>> {
        self.get_attribute(name)
            .map(|value| Field::Text(Cow::Borrowed(value)))
    }

    fn set_open_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        let index = self.position(name)?;
        Some(
            value
                .into_text(Self::NAME, name)
                .map(|text| self.entries[index].value = Some(text)),
        )
    }

    fn delete_open_field(&mut self, name: &str) -> Option<FieldResult<()>> {
        let index = self.position(name)?;
        self.entries.remove(index);
        Some(Ok(()))
    }
}

// ============================================================================
// Root
// ============================================================================

/// One parsed route line.
///
/// Own fields: `raw_text`, `destination` (the normalized prefix the table indexes
/// by), and `via`/`dev`, which read and write through to the info clause. The own
/// `destination` field shadows the `destination` child; use [Route::destination] or
/// `child("destination")` to reach the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    core: NodeCore,
    key: String,
    destination: DestinationSpec,
    info: InfoSpec,
    attributes: AttributeTail,
}

impl Route {
    /// The normalized destination prefix (table key)
    pub fn prefix(&self) -> &str {
        &self.key
    }

    /// The prefix with its length stripped
    pub fn bare_address(&self) -> &str {
        self.key.split('/').next().unwrap_or_default()
    }

    pub fn destination(&self) -> &DestinationSpec {
        &self.destination
    }

    pub fn info(&self) -> &InfoSpec {
        &self.info
    }

    pub fn attributes(&self) -> &AttributeTail {
        &self.attributes
    }

    pub fn via(&self) -> Option<&str> {
        self.info.via()
    }

    pub fn dev(&self) -> Option<&str> {
        self.info.dev()
    }

    pub fn attribute(&self, keyword: &str) -> Option<&str> {
        self.attributes.get_attribute(keyword)
    }

    /// The options this route was parsed with
    pub fn options(&self) -> ParseOptions {
        ParseOptions {
            reconstruct_children: self.core.reconstructs_children(),
            family: self.destination.family,
        }
    }
}

impl GrammarNode for Route {
    const NAME: &'static str = "route";
    // The root claims nothing itself; a missing destination is reported by that child
    const OPTIONAL: bool = true;
    const EXPECTED: &'static str = "a route line";

    fn empty(options: &ParseOptions) -> Self {
        Route {
            core: NodeCore::new(options),
            key: String::new(),
            destination: DestinationSpec::empty(options),
            info: InfoSpec::empty(options),
            attributes: AttributeTail::empty(options),
        }
    }

    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn match_tokens<'t>(&mut self, tokens: &'t [String]) -> ParseResult<&'t [String]> {
        Ok(tokens)
    }

    fn add_children<'t>(
        &mut self,
        remainder: &'t [String],
        options: &ParseOptions,
    ) -> ParseResult<&'t [String]> {
        let (children, rest) = thread_children(&ROUTE_CHILDREN, remainder, options)?;
        for child in children {
            match child {
                Node::Destination(node) => self.destination = node,
                Node::Info(node) => self.info = node,
                Node::Attributes(node) => self.attributes = node,
            }
        }
        self.key = self.destination.prefix();
        Ok(rest)
    }

    fn own_field(&self, name: &str) -> Option<Field<'_>> {
        Some(match name {
            "destination" => Field::Text(Cow::Borrowed(&self.key)),
            "via" => optional_text(&self.info.via),
            "dev" => optional_text(&self.info.dev),
            _ => return None,
        })
    }

    fn set_own_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        let slot = match name {
            "destination" => {
                return Some(
                    value
                        .into_text(Self::NAME, name)
                        .map(|text| self.key = text),
                )
            }
            "via" => self.info.via_mut(),
            "dev" => self.info.dev_mut(),
            _ => return None,
        };
        Some(
            value
                .into_text(Self::NAME, name)
                .map(|text| *slot = Some(text)),
        )
    }

    fn delete_own_field(&mut self, name: &str) -> Option<FieldResult<()>> {
        match name {
            "destination" => Some(Err(required::<Self>(name))),
            "via" => {
                *self.info.via_mut() = None;
                Some(Ok(()))
            }
            "dev" => {
                *self.info.dev_mut() = None;
                Some(Ok(()))
            }
            _ => None,
        }
    }

    fn children(&self) -> Vec<NodeRef<'_>> {
        vec![
            NodeRef::Destination(&self.destination),
            NodeRef::Info(&self.info),
            NodeRef::Attributes(&self.attributes),
        ]
    }

    fn set_child(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        let kind = ROUTE_CHILDREN.into_iter().find(|kind| kind.name() == name)?;
        Some(match (kind, value) {
            (NodeKind::Destination, FieldValue::Node(Node::Destination(node))) => {
                self.destination = node;
                self.key = self.destination.prefix();
                Ok(())
            }
            (NodeKind::Info, FieldValue::Node(Node::Info(node))) => {
                self.info = node;
                Ok(())
            }
            (NodeKind::Attributes, FieldValue::Node(Node::Attributes(node))) => {
                self.attributes = node;
                Ok(())
            }
            _ => Err(mismatch::<Self>(name, kind_description(kind))),
        })
    }

    fn delete_child(&mut self, name: &str) -> Option<FieldResult<()>> {
        let kind = ROUTE_CHILDREN.into_iter().find(|kind| kind.name() == name)?;
        let options = self.options();
        match kind {
            NodeKind::Destination => return Some(Err(required::<Self>(name))),
            NodeKind::Info => self.info = InfoSpec::empty(&options),
            NodeKind::Attributes => self.attributes = AttributeTail::empty(&options),
        }
        Some(Ok(()))
    }

    fn open_field(&self, name: &str) -> Option<Field<'_>> {
        self.attributes.open_field(name)
    }

    fn set_open_field(&mut self, name: &str, value: FieldValue) -> Option<FieldResult<()>> {
        self.attributes.set_open_field(name, value)
    }

    fn delete_open_field(&mut self, name: &str) -> Option<FieldResult<()>> {
        self.attributes.delete_open_field(name)
    }

    /// Without child reconstruction the root still prints the destination it is
    /// keyed by, so a table never renders as blank lines
    fn to_text(&self) -> String {
        if !self.core.reconstructs_children() {
            return self.destination.raw_text().to_string();
        }
        self.children()
            .iter()
            .map(|child| child.to_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn kind_description(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Destination => "a destination node",
        NodeKind::Info => "an info node",
        NodeKind::Attributes => "an attributes node",
    }
}
