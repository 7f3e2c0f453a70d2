use super::types::LogLevel;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime configuration of the converter process.
///
/// Values come from an optional TOML file and are then overridden by the
/// command line, so a deployment can ship a file and still tweak a single
/// run.
///
/// # Examples
///
/// ```
/// use requests_converter::configuration::Config;
///
/// let config = Config::from_toml_str("log_level = \"debug\"\nscript_dir = \"/tmp/scripts\"").unwrap();
/// assert_eq!(config.log_level.to_filter(), log::LevelFilter::Debug);
/// assert!(config.input.is_none());
/// ```
///
/// # Fields Overview
///
/// - `input`: file with captured streams, standard input when unset
/// - `output`: file receiving the converted chunks, standard output when unset
/// - `script_dir`: if set, every generated script is also written there
/// - `log_level`: default verbosity, `RUST_LOG` still takes precedence per module
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub script_dir: Option<PathBuf>,
    pub log_level: LogLevel,
}

/// Environment variable read when `--script-dir` is not given.
pub const SCRIPT_DIR_ENV: &str = "REQUESTS_CONVERTER_OUTPUT_DIR";

/// Command line of the `pythonrequests` binary.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pythonrequests")]
#[command(version)]
#[command(about = "Renders captured HTTP streams as Python requests replay scripts")]
pub struct CliArgs {
    /// TOML configuration file
    ///
    /// # Command Line
    /// Use `--config <FILE>` to set this value from the CLI
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Read streams from this file instead of standard input
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Write results to this file instead of standard output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory where every generated script is saved as `stream-<id>.py`
    #[arg(long, env = SCRIPT_DIR_ENV)]
    pub script_dir: Option<PathBuf>,

    /// One of off, error, warn, info, debug, trace
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builds the configuration for one run: the file named by `--config`
    /// if any, then every flag given on the command line.
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args)?;
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &CliArgs) -> Result<(), ConfigError> {
        if let Some(input) = &args.input {
            self.input = Some(input.clone());
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(dir) = &args.script_dir {
            self.script_dir = Some(dir.clone());
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.parse()?;
        }
        Ok(())
    }
}
