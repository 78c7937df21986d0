//! Node snapshot - a normalized, serializable view of parsed routes
//!
//! Every output format renders from a [NodeSnapshot] tree instead of walking the
//! grammar nodes itself. Children that matched no tokens are left out, so an
//! unmatched optional clause does not show up as an empty node.

use crate::iproute::parsing::{GrammarNode, Route};
use crate::iproute::table::RoutingTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// The kind of node (`table`, `route`, `destination`, `info`, `attributes`, `attribute`)
    pub node_type: String,

    /// The primary text of the node
    pub label: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn new(node_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            label: label.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds the attribute only when there is a value
    pub fn with_optional_attribute(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_attribute(key, value),
            None => self,
        }
    }

    pub fn with_child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }
}

/// Snapshot of one route and its matched children
pub fn snapshot_route(route: &Route) -> NodeSnapshot {
    let mut snapshot = NodeSnapshot::new("route", route.prefix())
        .with_optional_attribute("via", route.via())
        .with_optional_attribute("dev", route.dev());

    let destination = route.destination();
    if !destination.raw_text().is_empty() {
        let prefix_len = destination.prefix_len().map(|len| len.to_string());
        snapshot = snapshot.with_child(
            NodeSnapshot::new("destination", destination.raw_text())
                .with_optional_attribute("type", destination.route_type())
                .with_attribute("address", destination.address())
                .with_optional_attribute("prefix_len", prefix_len.as_deref())
                .with_attribute("prefix", destination.prefix()),
        );
    }

    let info = route.info();
    if !info.raw_text().is_empty() {
        snapshot = snapshot.with_child(
            NodeSnapshot::new("info", info.raw_text())
                .with_optional_attribute("via", info.via())
                .with_optional_attribute("via_family", info.via_family())
                .with_optional_attribute("dev", info.dev()),
        );
    }

    let attributes = route.attributes();
    if !attributes.is_empty() {
        let mut tail = NodeSnapshot::new("attributes", attributes.raw_text());
        for attribute in attributes.iter() {
            tail = tail.with_child(
                NodeSnapshot::new("attribute", attribute.keyword.as_str())
                    .with_optional_attribute("value", attribute.value.as_deref()),
            );
        }
        snapshot = snapshot.with_child(tail);
    }

    snapshot
}

/// Snapshot of a whole table, routes in source order
pub fn snapshot_table(table: &RoutingTable) -> NodeSnapshot {
    let mut snapshot = NodeSnapshot::new("table", table.description().unwrap_or_default())
        .with_attribute("routes", table.len().to_string());
    for route in table.routes() {
        snapshot = snapshot.with_child(snapshot_route(route));
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iproute::parsing::parse_line;

    #[test]
    fn test_route_snapshot_structure() {
        let route = parse_line("unicast 10.0.0.0/8 via 10.0.0.1 dev eth0 onlink metric 5").unwrap();
        let snapshot = snapshot_route(&route);

        assert_eq!(snapshot.node_type, "route");
        assert_eq!(snapshot.label, "10.0.0.0/8");
        assert_eq!(snapshot.attributes["via"], "10.0.0.1");
        assert_eq!(snapshot.children.len(), 3);

        let destination = &snapshot.children[0];
        assert_eq!(destination.label, "unicast 10.0.0.0/8");
        assert_eq!(destination.attributes["type"], "unicast");
        assert_eq!(destination.attributes["prefix_len"], "8");

        let tail = &snapshot.children[2];
        assert_eq!(tail.children.len(), 2);
        assert_eq!(tail.children[0].label, "onlink");
        assert!(tail.children[0].attributes.is_empty());
        assert_eq!(tail.children[1].attributes["value"], "5");
    }

    #[test]
    fn test_unmatched_children_are_omitted() {
        let route = parse_line("10.0.0.0/8 metric 5").unwrap();
        let snapshot = snapshot_route(&route);
        let kinds: Vec<_> = snapshot.children.iter().map(|c| c.node_type.as_str()).collect();
        assert_eq!(kinds, vec!["destination", "attributes"]);
        assert!(!snapshot.attributes.contains_key("via"));
    }
}
