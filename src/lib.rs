//! # iproute
//!
//! A grammar-driven parser for the routing table text printed by `ip route`.
//!
//! Layout
//!
//!     src/iproute
//!       ├── lexing      Splits command output into per-line token lists (logos)
//!       ├── parsing     The node framework and the route grammar built on it
//!       ├── table       Indexes parsed routes by prefix and by bare address
//!       ├── command     Fetches the live table from the external `ip` tool
//!       ├── formats     Text, json, yaml and treeviz rendering
//!       ├── config      Layered configuration (embedded defaults + user files)
//!       └── testing     Verified samples and fluent route assertions
//!
//! The flow is always lexing -> parsing -> table. Each route line is parsed on its
//! own, so a bad line aborts the table build instead of silently disappearing.

pub mod iproute;
