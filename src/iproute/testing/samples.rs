//! Verified route table samples, embedded at compile time from `samples/`

use crate::iproute::parsing::{Family, ParseOptions};
use crate::iproute::table::{RoutingTable, TableOptions};

pub struct Samples;

impl Samples {
    /// A gateway's IPv4 main table: tunnels, `default`, host routes, and two
    /// prefixes sharing the address `10.65.1.0`
    pub const IPV4_MAIN: &'static str = "ipv4_main.txt";
    /// `ip -6 route` output; `default` expands to `::/0`
    pub const IPV6_MAIN: &'static str = "ipv6_main.txt";
    /// Route type keywords and value-less flags
    pub const TYPED_ROUTES: &'static str = "typed_routes.txt";
    /// Two `default` routes on different interfaces
    pub const DUPLICATES: &'static str = "duplicates.txt";

    const ALL: [(&'static str, &'static str); 4] = [
        (Self::IPV4_MAIN, include_str!("../../../samples/ipv4_main.txt")),
        (Self::IPV6_MAIN, include_str!("../../../samples/ipv6_main.txt")),
        (Self::TYPED_ROUTES, include_str!("../../../samples/typed_routes.txt")),
        (Self::DUPLICATES, include_str!("../../../samples/duplicates.txt")),
    ];

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|(name, _)| *name)
    }

    pub fn get(name: &str) -> Option<&'static str> {
        Self::ALL
            .iter()
            .find(|(sample, _)| *sample == name)
            .map(|(_, text)| *text)
    }

    /// Options a sample is meant to be parsed with
    pub fn options(name: &str) -> TableOptions {
        let family = if name == Self::IPV6_MAIN {
            Family::Inet6
        } else {
            Family::Inet
        };
        TableOptions {
            parse: ParseOptions {
                family,
                ..ParseOptions::default()
            },
            ..TableOptions::default()
        }
    }

    /// Builds the sample's table, panicking on unknown names or parse failures
    pub fn table(name: &str) -> RoutingTable {
        let text = Self::get(name).unwrap_or_else(|| panic!("no sample named {name}"));
        RoutingTable::from_text(text, &Self::options(name))
            .unwrap_or_else(|err| panic!("sample {name} failed to parse: {err}"))
            .with_description(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_sample_parses() {
        for name in Samples::names() {
            let table = Samples::table(name);
            assert!(!table.is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn test_unknown_sample() {
        assert!(Samples::get("missing.txt").is_none());
    }
}
