//! Fluent assertion API for routes and tables

use super::testing_matchers::TextMatch;
use crate::iproute::lexing::tokenize_line;
use crate::iproute::parsing::{parse_route_with, GrammarNode, Route};
use crate::iproute::table::RoutingTable;

// ============================================================================
// Entry Points
// ============================================================================

/// Create an assertion builder for a single route
pub fn assert_route(route: &Route) -> RouteAssertion<'_> {
    RouteAssertion {
        route,
        context: format!("route {}", route.prefix()),
    }
}

/// Create an assertion builder for a table
pub fn assert_table(table: &RoutingTable) -> TableAssertion<'_> {
    TableAssertion { table }
}

// ============================================================================
// Table Assertions
// ============================================================================

pub struct TableAssertion<'a> {
    table: &'a RoutingTable,
}

impl<'a> TableAssertion<'a> {
    pub fn route_count(self, expected: usize) -> Self {
        let actual = self.table.len();
        assert_eq!(
            actual,
            expected,
            "Expected {} routes, found {}: [{}]",
            expected,
            actual,
            summarize_routes(self.table)
        );
        self
    }

    /// Assert on the route found by `key` (prefix, `default`, or bare address)
    pub fn route<F>(self, key: &str, assertion: F) -> Self
    where
        F: FnOnce(RouteAssertion<'a>),
    {
        let route = match self.table.lookup(key) {
            Ok(route) => route,
            Err(err) => panic!(
                "lookup of '{}' failed: {} (table has [{}])",
                key,
                err,
                summarize_routes(self.table)
            ),
        };
        assertion(RouteAssertion {
            route,
            context: format!("table[{}]", key),
        });
        self
    }

    pub fn missing(self, key: &str) -> Self {
        assert!(
            self.table.get(key).is_none(),
            "Expected no route for '{}', found {}",
            key,
            self.table.get(key).map(|r| r.to_text()).unwrap_or_default()
        );
        self
    }

    /// Assert the prefixes in iteration order
    pub fn prefixes(self, expected: &[&str]) -> Self {
        let actual: Vec<&str> = self.table.routes().map(Route::prefix).collect();
        assert_eq!(actual, expected, "route order differs");
        self
    }
}

fn summarize_routes(table: &RoutingTable) -> String {
    table
        .routes()
        .map(Route::prefix)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Route Assertions
// ============================================================================

pub struct RouteAssertion<'a> {
    route: &'a Route,
    context: String,
}

impl<'a> RouteAssertion<'a> {
    /// Normalized prefix, the table key
    pub fn prefix(self, expected: &str) -> Self {
        assert_eq!(
            self.route.prefix(),
            expected,
            "{}: Expected prefix '{}', found '{}'",
            self.context,
            expected,
            self.route.prefix()
        );
        self
    }

    /// Destination text as written on the line (keyword included)
    pub fn destination(self, expected: &str) -> Self {
        TextMatch::Exact(expected.to_string()).assert(
            self.route.destination().raw_text(),
            &format!("{}: destination", self.context),
        );
        self
    }

    pub fn route_type(self, expected: &str) -> Self {
        assert_eq!(
            self.route.destination().route_type(),
            Some(expected),
            "{}: Expected route type '{}'",
            self.context,
            expected
        );
        self
    }

    pub fn no_route_type(self) -> Self {
        assert_eq!(
            self.route.destination().route_type(),
            None,
            "{}: Expected no route type keyword",
            self.context
        );
        self
    }

    pub fn via(self, expected: &str) -> Self {
        assert_eq!(
            self.route.via(),
            Some(expected),
            "{}: Expected next hop '{}'",
            self.context,
            expected
        );
        self
    }

    pub fn no_via(self) -> Self {
        assert_eq!(
            self.route.via(),
            None,
            "{}: Expected a directly connected route",
            self.context
        );
        self
    }

    pub fn dev(self, expected: &str) -> Self {
        assert_eq!(
            self.route.dev(),
            Some(expected),
            "{}: Expected device '{}'",
            self.context,
            expected
        );
        self
    }

    pub fn no_dev(self) -> Self {
        assert_eq!(
            self.route.dev(),
            None,
            "{}: Expected no device",
            self.context
        );
        self
    }

    /// Keyword/value attribute; use `""` for flags
    pub fn attribute(self, keyword: &str, expected: &str) -> Self {
        assert_eq!(
            self.route.attribute(keyword),
            Some(expected),
            "{}: Expected attribute {} = '{}', attributes are '{}'",
            self.context,
            keyword,
            expected,
            self.route.attributes().raw_text()
        );
        self
    }

    pub fn flag(self, keyword: &str) -> Self {
        assert!(
            self.route.attributes().has_flag(keyword),
            "{}: Expected flag '{}', attributes are '{}'",
            self.context,
            keyword,
            self.route.attributes().raw_text()
        );
        self
    }

    pub fn attribute_count(self, expected: usize) -> Self {
        let actual = self.route.attributes().len();
        assert_eq!(
            actual,
            expected,
            "{}: Expected {} attributes, found {} ('{}')",
            self.context,
            expected,
            actual,
            self.route.attributes().raw_text()
        );
        self
    }

    pub fn text(self, expected: &str) -> Self {
        TextMatch::Exact(expected.to_string()).assert(&self.route.to_text(), &self.context);
        self
    }

    pub fn text_contains(self, substring: &str) -> Self {
        TextMatch::Contains(substring.to_string()).assert(&self.route.to_text(), &self.context);
        self
    }

    /// Re-parsing the reconstructed text, with the options the route was parsed
    /// with, yields the same route
    pub fn round_trips(self) -> Self {
        let text = self.route.to_text();
        let reparsed = parse_route_with(&tokenize_line(&text), &self.route.options())
            .unwrap_or_else(|err| panic!("{}: '{}' did not re-parse: {}", self.context, text, err));
        assert_eq!(
            reparsed.to_text(),
            text,
            "{}: reconstructed text changed on re-parse",
            self.context
        );
        assert_eq!(
            reparsed.prefix(),
            self.route.prefix(),
            "{}: prefix changed on re-parse",
            self.context
        );
        self
    }
}
