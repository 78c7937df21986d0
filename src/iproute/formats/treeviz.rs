//! Treeviz formatter
//!
//! One line per node, nesting drawn with box connectors:
//!
//!     └─ route: 0.0.0.0/0
//!        ├─ destination: default
//!        ├─ info: via 10.0.0.1 dev eth0
//!        └─ attributes: metric 100
//!           └─ attribute: metric = 100
//!
//! Labels longer than 50 characters are truncated.

use super::snapshot::NodeSnapshot;

const MAX_LABEL: usize = 50;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn display_label(node: &NodeSnapshot) -> String {
    match (node.node_type.as_str(), node.attributes.get("value")) {
        ("attribute", Some(value)) => format!("{} = {}", node.label, value),
        _ => truncate(&node.label, MAX_LABEL),
    }
}

/// Renders the top-level nodes as siblings
pub fn to_treeviz_str(nodes: &[NodeSnapshot]) -> String {
    let mut result = String::new();
    append_children(&mut result, nodes, "");
    result
}

fn append_children(result: &mut String, children: &[NodeSnapshot], prefix: &str) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        append_node(result, child, prefix, is_last);
    }
}

fn append_node(result: &mut String, node: &NodeSnapshot, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    let label = display_label(node);

    if label.is_empty() {
        result.push_str(&format!("{}{} {}\n", prefix, connector, node.node_type));
    } else {
        result.push_str(&format!(
            "{}{} {}: {}\n",
            prefix, connector, node.node_type, label
        ));
    }

    let new_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    append_children(result, &node.children, &new_prefix);
}
