//! Routing table
//!
//!     A table is built in one go from tokenized lines: every non-empty line is parsed
//!     into a [Route] and indexed twice, by its normalized prefix (`10.0.0.0/8`) and by
//!     its bare address (`10.0.0.0`). Any line that fails to parse aborts the whole
//!     build. A table missing a route the caller expects is worse than no table.
//!
//! Duplicates
//!
//!     Two lines can normalize to the same prefix (the kernel keeps one route per
//!     prefix and metric, `ip` prints them all). [DuplicatePolicy] decides: the default
//!     keeps the last line and logs a warning, `Reject` fails the build.
//!
//! Lookup
//!
//!     `default` is an alias for the family's zero-length prefix. A key without a `/`
//!     that is not itself a prefix falls back to the bare address index. When several
//!     prefixes share that address the lookup fails with
//!     [TableError::AmbiguousAddress] instead of guessing.

use crate::iproute::command::{CommandError, RouteSource};
use crate::iproute::lexing::tokenize;
use crate::iproute::parsing::{
    parse_route_with, GrammarNode, ParseError, ParseOptions, Route, DEFAULT_KEYWORD,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What to do when two lines index to the same prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later line replaces the earlier one, keeping its position
    #[default]
    LastWriteWins,
    /// The build fails with [TableError::DuplicateDestination]
    Reject,
}

/// Options for building a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableOptions {
    pub parse: ParseOptions,
    pub duplicates: DuplicatePolicy,
}

/// Errors from building or querying a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("line {line}: {source} in `{text}`")]
    Parse {
        line: usize,
        text: String,
        #[source]
        source: ParseError,
    },
    #[error("line {line}: destination {key} is already defined on line {first_line}")]
    DuplicateDestination {
        key: String,
        first_line: usize,
        line: usize,
    },
    #[error("address {address} matches several routes: {}", .candidates.join(", "))]
    AmbiguousAddress {
        address: String,
        candidates: Vec<String>,
    },
    #[error("no route to {0}")]
    NotFound(String),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Parsed routes plus both lookup maps. Always replaced as a whole.
#[derive(Debug, Clone, Default)]
struct TableIndex {
    routes: Vec<Route>,
    /// Source line (1-based) each slot came from
    lines: Vec<usize>,
    by_prefix: HashMap<String, usize>,
    by_address: HashMap<String, Vec<usize>>,
}

impl TableIndex {
    fn insert(&mut self, route: Route, line: usize, duplicates: DuplicatePolicy) -> Result<(), TableError> {
        let key = route.prefix().to_string();
        match self.by_prefix.get(&key) {
            Some(&slot) => match duplicates {
                DuplicatePolicy::Reject => {
                    return Err(TableError::DuplicateDestination {
                        key,
                        first_line: self.lines[slot],
                        line,
                    })
                }
                DuplicatePolicy::LastWriteWins => {
                    warn!(
                        prefix = %key,
                        previous_line = self.lines[slot],
                        line,
                        "duplicate destination, keeping the later route"
                    );
                    self.routes[slot] = route;
                    self.lines[slot] = line;
                }
            },
            None => {
                debug!(prefix = %key, line, "indexed route");
                self.by_prefix.insert(key, self.routes.len());
                self.routes.push(route);
                self.lines.push(line);
            }
        }
        Ok(())
    }

    fn index_addresses(&mut self) {
        for (slot, route) in self.routes.iter().enumerate() {
            self.by_address
                .entry(route.bare_address().to_string())
                .or_default()
                .push(slot);
        }
    }
}

/// BuildTable: parses every non-empty line and indexes the results
pub fn build_table(lines: &[Vec<String>], options: &TableOptions) -> Result<RoutingTable, TableError> {
    let mut index = TableIndex::default();

    for (number, tokens) in lines.iter().enumerate() {
        if tokens.is_empty() {
            continue;
        }
        let line = number + 1;
        let route = parse_route_with(tokens, &options.parse).map_err(|source| TableError::Parse {
            line,
            text: tokens.join(" "),
            source,
        })?;
        index.insert(route, line, options.duplicates)?;
    }
    index.index_addresses();

    info!(routes = index.routes.len(), "built routing table");
    Ok(RoutingTable {
        description: None,
        options: *options,
        index,
    })
}

/// Routes indexed by destination prefix and by bare address
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    description: Option<String>,
    options: TableOptions,
    index: TableIndex,
}

impl RoutingTable {
    /// An empty table that will parse with `options` on [load](Self::load)
    pub fn new(options: TableOptions) -> Self {
        Self {
            description: None,
            options,
            index: TableIndex::default(),
        }
    }

    /// Tokenizes and builds a table from `ip route` text
    pub fn from_text(text: &str, options: &TableOptions) -> Result<Self, TableError> {
        build_table(&tokenize(text), options)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Rebuilds from `text`. On failure the current contents stay untouched.
    pub fn load(&mut self, text: &str) -> Result<(), TableError> {
        let fresh = build_table(&tokenize(text), &self.options)?;
        self.index = fresh.index;
        Ok(())
    }

    /// Fetches the table text from `source` and rebuilds from it
    pub fn load_from(&mut self, source: &dyn RouteSource) -> Result<(), TableError> {
        let text = source.fetch_route_table()?;
        self.load(&text)
    }

    /// Looks up a route by prefix, `default`, or bare address
    pub fn lookup(&self, key: &str) -> Result<&Route, TableError> {
        let slot = self.slot(key)?;
        Ok(&self.index.routes[slot])
    }

    /// Like [lookup](Self::lookup) but for in-place edits. The index keys stay as
    /// they were at build time.
    pub fn lookup_mut(&mut self, key: &str) -> Result<&mut Route, TableError> {
        let slot = self.slot(key)?;
        Ok(&mut self.index.routes[slot])
    }

    /// Non-failing lookup; ambiguous bare addresses give `None`
    pub fn get(&self, key: &str) -> Option<&Route> {
        self.lookup(key).ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slot(key).is_ok()
    }

    /// Routes in order of first appearance
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.index.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.index.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.routes.is_empty()
    }

    fn slot(&self, key: &str) -> Result<usize, TableError> {
        let key = if key == DEFAULT_KEYWORD {
            self.options.parse.family.default_prefix()
        } else {
            key
        };

        if let Some(&slot) = self.index.by_prefix.get(key) {
            return Ok(slot);
        }
        if !key.contains('/') {
            match self.index.by_address.get(key).map(Vec::as_slice) {
                Some([slot]) => return Ok(*slot),
                Some(slots) if !slots.is_empty() => {
                    return Err(TableError::AmbiguousAddress {
                        address: key.to_string(),
                        candidates: slots
                            .iter()
                            .map(|slot| self.index.routes[*slot].prefix().to_string())
                            .collect(),
                    })
                }
                _ => {}
            }
        }
        Err(TableError::NotFound(key.to_string()))
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.routes().map(|route| route.to_text()).collect();
        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iproute::command::StaticSource;

    const TABLE: &str = "\
default via 172.16.0.1 dev eth0  metric 100
172.16.0.0/24 dev eth0  proto kernel  scope link  src 172.16.0.200
10.65.1.0/25 dev tun0  proto kernel  scope link  src 10.65.1.6
10.65.1.0/24 via 10.65.1.1 dev tun0  metric 101
10.65.0.1 via 10.65.1.1 dev tun0  metric 101
";

    fn table() -> RoutingTable {
        RoutingTable::from_text(TABLE, &TableOptions::default()).unwrap()
    }

    #[test]
    fn test_indexes_every_line() {
        let table = table();
        assert_eq!(table.len(), 5);
        assert!(table.contains("172.16.0.0/24"));
        assert!(table.contains("10.65.0.1/32"));
    }

    #[test]
    fn test_default_alias() {
        let table = table();
        let by_alias = table.lookup("default").unwrap();
        let by_prefix = table.lookup("0.0.0.0/0").unwrap();
        assert_eq!(by_alias, by_prefix);
        assert_eq!(by_alias.via(), Some("172.16.0.1"));
    }

    #[test]
    fn test_bare_address_fallback() {
        let table = table();
        assert_eq!(table.lookup("172.16.0.0").unwrap().prefix(), "172.16.0.0/24");
        assert_eq!(table.lookup("10.65.0.1").unwrap().prefix(), "10.65.0.1/32");
    }

    #[test]
    fn test_ambiguous_bare_address() {
        let err = table().lookup("10.65.1.0").unwrap_err();
        match err {
            TableError::AmbiguousAddress {
                address,
                candidates,
            } => {
                assert_eq!(address, "10.65.1.0");
                assert_eq!(candidates, vec!["10.65.1.0/25", "10.65.1.0/24"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(table().get("10.65.1.0").is_none());
    }

    #[test]
    fn test_missing_route() {
        let err = table().lookup("192.0.2.0/24").unwrap_err();
        assert!(matches!(err, TableError::NotFound(ref key) if key == "192.0.2.0/24"));
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let err = RoutingTable::from_text(
            "10.0.0.0/8 dev eth0\n\n10.1.0.0/16 dev\n",
            &TableOptions::default(),
        )
        .unwrap_err();
        match err {
            TableError::Parse { line, text, .. } => {
                assert_eq!(line, 3);
                assert_eq!(text, "10.1.0.0/16 dev");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_last_write_wins() {
        let text = "10.0.0.0/8 dev eth0 metric 10\n10.1.0.0/16 dev eth1\n10.0.0.0/8 dev eth2 metric 20\n";
        let table = RoutingTable::from_text(text, &TableOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        let route = table.lookup("10.0.0.0/8").unwrap();
        assert_eq!(route.dev(), Some("eth2"));
        assert_eq!(route.attribute("metric"), Some("20"));
        // The replacement keeps the first slot
        let order: Vec<_> = table.routes().map(|r| r.prefix().to_string()).collect();
        assert_eq!(order, vec!["10.0.0.0/8", "10.1.0.0/16"]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let options = TableOptions {
            duplicates: DuplicatePolicy::Reject,
            ..TableOptions::default()
        };
        let text = "10.0.0.0/8 dev eth0\n10.0.0.0/8 dev eth1\n";
        let err = RoutingTable::from_text(text, &options).unwrap_err();
        assert!(matches!(
            err,
            TableError::DuplicateDestination { ref key, first_line: 1, line: 2 } if key == "10.0.0.0/8"
        ));
    }

    #[test]
    fn test_bare_and_prefixed_forms_collide() {
        // `10.0.0.1` normalizes to `10.0.0.1/32`
        let options = TableOptions {
            duplicates: DuplicatePolicy::Reject,
            ..TableOptions::default()
        };
        let text = "10.0.0.1 dev eth0\n10.0.0.1/32 dev eth1\n";
        assert!(RoutingTable::from_text(text, &options).is_err());
    }

    #[test]
    fn test_failed_reload_keeps_previous_contents() {
        let mut table = table();
        let err = table.load("10.0.0.0/8 dev eth0\nvia\n");
        assert!(err.is_err());
        assert_eq!(table.len(), 5);
        assert!(table.contains("default"));

        table.load("10.0.0.0/8 dev eth0\n").unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.contains("default"));
    }

    #[test]
    fn test_load_from_source() {
        let mut table = RoutingTable::new(TableOptions::default()).with_description("main");
        assert!(table.is_empty());
        table
            .load_from(&StaticSource::new("192.168.1.0/24 dev wlan0 proto kernel"))
            .unwrap();
        assert_eq!(table.description(), Some("main"));
        assert_eq!(table.lookup("192.168.1.0").unwrap().dev(), Some("wlan0"));
    }

    #[test]
    fn test_lookup_mut_edits_in_place() {
        let mut table = table();
        table.lookup_mut("default").unwrap().set("via", "172.16.0.254").unwrap();
        assert_eq!(table.lookup("default").unwrap().via(), Some("172.16.0.254"));
    }

    #[test]
    fn test_display_reconstructs_lines() {
        let table = RoutingTable::from_text(
            "default via 10.0.0.1 dev eth0\n10.0.0.0/24 dev eth0  proto kernel  scope link\n",
            &TableOptions::default(),
        )
        .unwrap();
        assert_eq!(
            table.to_string(),
            "default via 10.0.0.1 dev eth0\n10.0.0.0/24 dev eth0 proto kernel scope link"
        );
    }
}
