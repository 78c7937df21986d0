//! Output formats for parsed routes and tables
//!
//!     - `text`: the reconstructed `ip route` lines
//!     - `json`, `yaml`: the [NodeSnapshot] tree, serialized with serde
//!     - `treeviz`: the same tree drawn one node per line

pub mod snapshot;
pub mod treeviz;

pub use snapshot::{snapshot_route, snapshot_table, NodeSnapshot};
pub use treeviz::to_treeviz_str;

use crate::iproute::parsing::{GrammarNode, Route};
use crate::iproute::table::RoutingTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown output format `{0}` (expected one of: text, json, yaml, treeviz)")]
    Unknown(String),
    #[error("failed to serialize as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to serialize as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Treeviz,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Text,
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Treeviz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Treeviz => "treeviz",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormatError::Unknown(s.to_string()))
    }
}

pub fn render_table(table: &RoutingTable, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(table.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&snapshot_table(table))?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&snapshot_table(table))?),
        OutputFormat::Treeviz => {
            // Routes are drawn as top-level siblings; the table node adds nothing
            let routes: Vec<_> = table.routes().map(snapshot_route).collect();
            Ok(to_treeviz_str(&routes))
        }
    }
}

pub fn render_route(route: &Route, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(route.to_text()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&snapshot_route(route))?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&snapshot_route(route))?),
        OutputFormat::Treeviz => Ok(to_treeviz_str(&[snapshot_route(route)])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iproute::table::TableOptions;

    fn table() -> RoutingTable {
        RoutingTable::from_text(
            "default via 10.0.0.1 dev eth0\n10.0.0.0/24 dev eth0 scope link\n",
            &TableOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TreeViz".parse::<OutputFormat>().unwrap(), OutputFormat::Treeviz);
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, FormatError::Unknown(ref name) if name == "xml"));
    }

    #[test]
    fn test_render_text() {
        assert_eq!(
            render_table(&table(), OutputFormat::Text).unwrap(),
            "default via 10.0.0.1 dev eth0\n10.0.0.0/24 dev eth0 scope link"
        );
    }

    #[test]
    fn test_render_json_is_the_snapshot() {
        let json = render_table(&table(), OutputFormat::Json).unwrap();
        let parsed: NodeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot_table(&table()));
        assert_eq!(parsed.attributes["routes"], "2");
        assert_eq!(parsed.children[0].label, "0.0.0.0/0");
    }

    #[test]
    fn test_render_yaml() {
        let yaml = render_table(&table(), OutputFormat::Yaml).unwrap();
        let parsed: NodeSnapshot = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.children.len(), 2);
    }

    #[test]
    fn test_render_treeviz_lists_routes() {
        let out = render_table(&table(), OutputFormat::Treeviz).unwrap();
        assert!(out.starts_with("├─ route: 0.0.0.0/0\n"));
        assert!(out.contains("└─ route: 10.0.0.0/24\n"));
        assert!(out.contains("   ├─ destination: 10.0.0.0/24\n"));
    }
}
