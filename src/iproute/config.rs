//! Configuration loader.
//!
//! `defaults/iproute.default.toml` is embedded into the binary so that the
//! documented defaults and runtime behavior stay in sync. Callers layer user files
//! and single-key overrides on top via [`Loader`] before deserializing into
//! [`IprouteConfig`].

use crate::iproute::command::IpCommand;
use crate::iproute::formats::OutputFormat;
use crate::iproute::parsing::{Family, ParseOptions};
use crate::iproute::table::{DuplicatePolicy, TableOptions};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_TOML: &str = include_str!("../../defaults/iproute.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IprouteConfig {
    pub command: CommandConfig,
    pub table: TableConfig,
    pub output: OutputConfig,
}

/// How to fetch the system routing table.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub family: Family,
    pub duplicates: DuplicatePolicy,
    pub reconstruct_children: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl IprouteConfig {
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            parse: ParseOptions {
                reconstruct_children: self.table.reconstruct_children,
                family: self.table.family,
            },
            duplicates: self.table.duplicates,
        }
    }

    pub fn ip_command(&self) -> IpCommand {
        IpCommand::new()
            .with_program(self.command.program.clone())
            .with_args(self.command.args.iter().cloned())
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer the per-user file from [`user_config_path`], if there is one.
    ///
    /// A missing file is fine; a present one that does not parse is an error at
    /// `build` time.
    pub fn with_user_file(self) -> Self {
        match user_config_path() {
            Some(path) => {
                debug!(path = %path.display(), "layering user configuration");
                self.with_optional_file(path)
            }
            None => self,
        }
    }

    /// Apply a single key/value override, e.g. from a CLI flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<IprouteConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<IprouteConfig, ConfigError> {
    Loader::new().build()
}

/// `$XDG_CONFIG_HOME/iproute/config.toml`, falling back to `~/.config`
pub fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("iproute").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.command.program, PathBuf::from("/sbin/ip"));
        assert_eq!(config.command.args, vec!["route"]);
        assert_eq!(config.table.family, Family::Inet);
        assert_eq!(config.table.duplicates, DuplicatePolicy::LastWriteWins);
        assert!(config.table.reconstruct_children);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.table_options(), TableOptions::default());
        assert_eq!(config.ip_command(), IpCommand::new());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("table.duplicates", "reject")
            .expect("override to apply")
            .set_override("output.format", "treeviz")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.table.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.output.format, OutputFormat::Treeviz);
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[table]\nfamily = \"inet6\"\n[command]\nargs = [\"-6\", \"route\"]"
        )
        .unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.table.family, Family::Inet6);
        // Keys the file leaves out keep their defaults
        assert_eq!(config.table.duplicates, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.ip_command().args(), ["-6", "route"]);
        assert_eq!(config.table_options().parse.family.default_prefix(), "::/0");
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new().with_file("/nonexistent/iproute.toml").build();
        assert!(result.is_err());
        let result = Loader::new().with_optional_file("/nonexistent/iproute.toml").build();
        assert!(result.is_ok());
    }

    #[test]
    fn layers_user_file_from_config_home() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join("iproute")).unwrap();
        std::fs::write(
            home.path().join("iproute").join("config.toml"),
            "[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let previous = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", home.path());
        let with_file = Loader::new().with_user_file().build();
        std::env::set_var("XDG_CONFIG_HOME", home.path().join("missing"));
        let without_file = Loader::new().with_user_file().build();
        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(with_file.unwrap().output.format, OutputFormat::Json);
        assert_eq!(without_file.unwrap().output.format, OutputFormat::Text);
    }

    #[test]
    fn rejects_unknown_policy() {
        let result = Loader::new()
            .set_override("table.duplicates", "first-write-wins")
            .unwrap()
            .build();
        assert!(result.is_err());
    }
}
