//! Parsing
//!
//!     Turns the tokens of one route line into a [Route] tree. The work is split in two:
//!
//!         - [node]: the framework. How a node claims tokens, records its raw text,
//!           threads the remainder through its children, and answers name-keyed
//!           reads and writes.
//!         - [grammar]: the concrete route grammar expressed with that framework.
//!
//!     Parsing is a single left-to-right pass with no backtracking. A line either
//!     parses completely or fails with a [ParseError]; there is no partial route.
//!
//! Reconstruction
//!
//!     `to_text()` rebuilds the line from the raw text each node matched, so field
//!     edits made after parsing do not show up in it. Replacing or deleting a whole
//!     child does, since the child's raw text goes with it.

pub mod error;
pub mod grammar;
pub mod node;

pub use error::{FieldError, FieldResult, ParseError, ParseResult};
pub use grammar::{
    Attribute, AttributeTail, DestinationSpec, InfoSpec, Node, NodeKind, NodeRef, Route,
    DEFAULT_KEYWORD, ROUTE_CHILDREN,
};
pub use node::{construct, Family, Field, FieldValue, GrammarNode, NodeCore, ParseOptions};

use crate::iproute::lexing::tokenize_line;

/// ParseOneLine with default options (children reconstructed, IPv4 `default`)
pub fn parse_route(tokens: &[String]) -> ParseResult<Route> {
    parse_route_with(tokens, &ParseOptions::default())
}

/// ParseOneLine: builds the route tree for one tokenized line
pub fn parse_route_with(tokens: &[String], options: &ParseOptions) -> ParseResult<Route> {
    let (route, rest) = construct::<Route>(tokens, options)?;
    // The attribute tail claims everything it is handed
    debug_assert!(rest.is_empty(), "unconsumed tokens: {:?}", rest);
    tracing::trace!(prefix = route.prefix(), tokens = tokens.len(), "parsed route");
    Ok(route)
}

/// Tokenizes and parses a single line of text
pub fn parse_line(line: &str) -> ParseResult<Route> {
    parse_route(&tokenize_line(line))
}
