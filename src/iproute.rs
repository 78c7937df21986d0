//! Main module for iproute library functionality

pub mod command;
pub mod config;
pub mod formats;
pub mod lexing;
pub mod parsing;
pub mod table;
pub mod testing;

pub use command::{CommandError, IpCommand, RouteSource, StaticSource};
pub use lexing::{tokenize, tokenize_line};
pub use parsing::{parse_route, parse_route_with, Family, ParseError, ParseOptions, Route};
pub use table::{build_table, DuplicatePolicy, RoutingTable, TableError, TableOptions};
