//! Route sources
//!
//!     A [RoutingTable](crate::iproute::table::RoutingTable) can load from any
//!     [RouteSource]. [IpCommand] runs the system `ip` binary directly (no shell, so
//!     arguments are never re-split or expanded); [StaticSource] hands back fixed text
//!     and is what tests and `--file` use.

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_PROGRAM: &str = "/sbin/ip";

/// Errors from running an external command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("`{program}` exited with {}: {message}", describe_code(.code))]
    Exit {
        program: String,
        /// `None` when the process was killed by a signal
        code: Option<i32>,
        /// Trimmed stderr
        message: String,
    },
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` printed output that is not UTF-8")]
    InvalidOutput { program: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Anything that can produce `ip route` formatted text
pub trait RouteSource {
    fn fetch_route_table(&self) -> Result<String, CommandError>;
}

/// Invocation of the `ip` binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl Default for IpCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl IpCommand {
    /// `/sbin/ip route`
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            args: vec!["route".to_string()],
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Replaces the argument list used by [route](Self::route)
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Runs the program with arbitrary arguments and returns its stdout
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<String, CommandError> {
        let program = self.program.display().to_string();
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
        debug!(program = %program, ?args, "running command");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| {
                error!(program = %program, %source, "failed to spawn command");
                CommandError::Spawn {
                    program: program.clone(),
                    source,
                }
            })?;

        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(program = %program, code = ?output.status.code(), %message, "command failed");
            return Err(CommandError::Exit {
                program,
                code: output.status.code(),
                message,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| CommandError::InvalidOutput { program })
    }

    /// Runs the configured route listing
    pub fn route(&self) -> Result<String, CommandError> {
        self.run(self.args.as_slice())
    }
}

impl RouteSource for IpCommand {
    fn fetch_route_table(&self) -> Result<String, CommandError> {
        self.route()
    }
}

/// Fixed table text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSource(String);

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl RouteSource for StaticSource {
    fn fetch_route_table(&self) -> Result<String, CommandError> {
        Ok(self.0.clone())
    }
}
