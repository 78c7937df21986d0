//! Testing utilities
//!
//! Two tools, meant to be used together:
//!
//! 1. [Samples] - verified `ip route` output. Real route tables have quirks (double
//!    spaces, typed routes, trailing flags) that hand-typed strings tend to miss,
//!    so table-level tests should start from a sample.
//! 2. [assert_route] / [assert_table] - fluent assertions that report which route
//!    and which field failed instead of a bare `left != right`.
//!
//! ```rust,ignore
//! use iproute::iproute::testing::{assert_table, Samples};
//!
//! let table = Samples::table(Samples::IPV4_MAIN);
//! assert_table(&table)
//!     .route_count(16)
//!     .route("default", |route| {
//!         route.via("216.244.91.33").dev("eth0").attribute_count(0);
//!     });
//! ```

pub mod samples;
pub mod testing_assertions;
pub mod testing_matchers;

pub use samples::Samples;
pub use testing_assertions::{assert_route, assert_table, RouteAssertion, TableAssertion};
pub use testing_matchers::TextMatch;
