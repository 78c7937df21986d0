//! Command-line interface for iproute
//! Parses `ip route` output (from the system or a file) and prints it back as text,
//! JSON, YAML or a tree.
//!
//! Usage:
//!   iproute show [--file `<path>`] [--format `<format>`]          - Print the whole table
//!   iproute get `<dest>` [--field `<name>`] [--file `<path>`]     - Print one route or one field of it
//!   iproute parse `<line>` [--format `<format>`]                  - Parse a single route line
//!
//! Global options: `--config <path>` layers a TOML file over the built-in defaults,
//! `-v`/`-vv` raise the log level (`RUST_LOG` takes precedence).

use clap::{Arg, ArgAction, ArgMatches, Command};
use config::ConfigError;
use iproute::iproute::command::{RouteSource, StaticSource};
use iproute::iproute::config::{IprouteConfig, Loader};
use iproute::iproute::formats::{render_route, render_table, FormatError, OutputFormat};
use iproute::iproute::lexing::tokenize_line;
use iproute::iproute::parsing::{parse_route_with, Field, FieldError, GrammarNode, ParseError};
use iproute::iproute::table::{RoutingTable, TableError};
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Table(#[from] TableError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Field(#[from] FieldError),
    #[error("{0}")]
    Format(#[from] FormatError),
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn build_cli() -> Command {
    let file_arg = Arg::new("file")
        .long("file")
        .short('F')
        .value_name("PATH")
        .help("Read route table text from a file ('-' for stdin) instead of running `ip route`");
    let format_arg = Arg::new("format")
        .long("format")
        .short('f')
        .value_name("FORMAT")
        .value_parser(["text", "json", "yaml", "treeviz"])
        .help("Output format (defaults to output.format from the configuration)");

    Command::new("iproute")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for parsing and querying iproute2 routing tables")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("show")
                .about("Parse and print the whole routing table")
                .arg(file_arg.clone())
                .arg(format_arg.clone()),
        )
        .subcommand(
            Command::new("get")
                .about("Look up one route by prefix, `default`, or bare address")
                .arg(
                    Arg::new("destination")
                        .help("Destination to look up")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("field")
                        .long("field")
                        .value_name("NAME")
                        .help("Print only this field (e.g. destination, via, dev, metric)"),
                )
                .arg(file_arg)
                .arg(format_arg.clone()),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a single route line and print it")
                .arg(
                    Arg::new("line")
                        .help("Route line, quoted")
                        .required(true)
                        .index(1),
                )
                .arg(format_arg),
        )
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<IprouteConfig, CliError> {
    let mut loader = Loader::new().with_user_file();
    if let Some(path) = matches.get_one::<String>("config") {
        debug!(path = %path, "layering configuration file");
        loader = loader.with_file(PathBuf::from(path));
    }
    Ok(loader.build()?)
}

fn output_format(matches: &ArgMatches, config: &IprouteConfig) -> Result<OutputFormat, CliError> {
    match matches.get_one::<String>("format") {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.output.format),
    }
}

fn read_source(path: &str) -> Result<StaticSource, CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_string(),
        source,
    };
    let text = if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(io_error)?;
        text
    } else {
        std::fs::read_to_string(path).map_err(io_error)?
    };
    Ok(StaticSource::new(text))
}

fn load_table(matches: &ArgMatches, config: &IprouteConfig) -> Result<RoutingTable, CliError> {
    let (source, description): (Box<dyn RouteSource>, String) =
        match matches.get_one::<String>("file") {
            Some(path) => {
                let source: Box<dyn RouteSource> = Box::new(read_source(path)?);
                (source, path.clone())
            }
            None => {
                let command = config.ip_command();
                let description = format!(
                    "{} {}",
                    command.program().display(),
                    command.args().join(" ")
                );
                let source: Box<dyn RouteSource> = Box::new(command);
                (source, description)
            }
        };

    info!(source = %description, "loading routing table");
    let mut table = RoutingTable::new(config.table_options()).with_description(description);
    table.load_from(source.as_ref())?;
    Ok(table)
}

fn handle_show_command(matches: &ArgMatches, config: &IprouteConfig) -> Result<String, CliError> {
    let format = output_format(matches, config)?;
    let table = load_table(matches, config)?;
    Ok(render_table(&table, format)?)
}

fn handle_get_command(matches: &ArgMatches, config: &IprouteConfig) -> Result<String, CliError> {
    let format = output_format(matches, config)?;
    let table = load_table(matches, config)?;
    let destination = matches
        .get_one::<String>("destination")
        .map(String::as_str)
        .unwrap_or_default();
    let route = table.lookup(destination)?;

    match matches.get_one::<String>("field") {
        Some(name) => Ok(match route.get(name)? {
            Field::Text(text) => text.into_owned(),
            Field::Unset => String::new(),
            Field::Node(node) => node.to_text(),
        }),
        None => Ok(render_route(route, format)?),
    }
}

fn handle_parse_command(matches: &ArgMatches, config: &IprouteConfig) -> Result<String, CliError> {
    let format = output_format(matches, config)?;
    let line = matches
        .get_one::<String>("line")
        .map(String::as_str)
        .unwrap_or_default();
    let route = parse_route_with(&tokenize_line(line), &config.table_options().parse)?;
    Ok(render_route(&route, format)?)
}

fn run(name: &str, matches: &ArgMatches) -> Result<String, CliError> {
    let config = load_config(matches)?;
    match name {
        "show" => handle_show_command(matches, &config),
        "get" => handle_get_command(matches, &config),
        "parse" => handle_parse_command(matches, &config),
        _ => unreachable!("clap rejects unknown subcommands"),
    }
}

fn main() {
    let matches = build_cli().get_matches();
    // subcommand_required guarantees a subcommand; global args are visible on it
    let Some((name, sub_matches)) = matches.subcommand() else {
        return;
    };
    init_tracing(sub_matches.get_count("verbose"));

    match run(name, sub_matches) {
        Ok(mut output) => {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            print!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
