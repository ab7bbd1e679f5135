// ABOUTME: Logging settings read from the [logging] section of parallax.toml
// ABOUTME: Environment variables and -v flags are layered on top of the file values

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// Directive list in `RUST_LOG` syntax, e.g. `info,parallax_compiler=debug`
pub const LOG_ENV: &str = "PARALLAX_LOG";
/// One of `compact`, `pretty` or `json`
pub const LOG_FORMAT_ENV: &str = "PARALLAX_LOG_FORMAT";
/// Also write log lines to this file
pub const LOG_FILE_ENV: &str = "PARALLAX_LOG_FILE";

/// A tracing level written as `"warn"`, `"debug"` and so on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogLevel(pub Level);

impl TryFrom<String> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        parse_log_level(&value).map(LogLevel)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.0.to_string().to_ascii_lowercase()
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        LogLevel(level)
    }
}

/// How console lines are written to stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("Unknown log format '{other}', expected compact, pretty or json"),
        }
    }
}

/// Logging settings for the parallax binary.
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "pretty"
/// file = "/tmp/parallax.log"
///
/// [logging.modules]
/// parallax_compiler = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Per-crate overrides keyed by tracing target
    pub modules: BTreeMap<String, LogLevel>,
    pub format: LogFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(Level::WARN),
            modules: BTreeMap::new(),
            format: LogFormat::Compact,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides from `lookup`. `PARALLAX_LOG` wins over `RUST_LOG`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(directives) = lookup(LOG_ENV).or_else(|| lookup("RUST_LOG")) {
            self.parse_directives(&directives)
                .context("Invalid log directives in environment")?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            self.format = format.parse()?;
        }
        if let Some(file) = lookup(LOG_FILE_ENV).filter(|path| !path.trim().is_empty()) {
            self.file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    /// Raise the global level for each `-v`: info, debug, then trace.
    ///
    /// Never lowers a level that was already more verbose.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        let requested = match verbosity {
            0 => return self,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        self.level = LogLevel(self.level.0.max(requested));
        self
    }

    /// Filter directives for the subscriber, global level first.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![String::from(self.level)];
        directives.extend(
            self.modules
                .iter()
                .map(|(module, level)| format!("{module}={}", String::from(*level))),
        );
        directives.join(",")
    }

    fn parse_directives(&mut self, directives: &str) -> Result<()> {
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((module, level)) => {
                    self.modules
                        .insert(module.trim().to_string(), LogLevel(parse_log_level(level)?));
                }
                None => self.level = LogLevel(parse_log_level(directive)?),
            }
        }
        Ok(())
    }
}

pub(crate) fn parse_log_level(value: &str) -> Result<Level> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("Invalid log level: {other}"),
    }
}
