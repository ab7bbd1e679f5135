// ABOUTME: Application configuration loaded from parallax.toml
// ABOUTME: Missing files fall back to defaults and invalid values are sanitized with a warning

use parallax_editor::SessionConfig;
use parallax_logging::{LoggingConfig, warn};
use parallax_types::{AnchorConfig, CompilerConfig, LayoutConfig, SyncConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "parallax.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for the whole application, one section per subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    pub compiler: CompilerConfig,
    pub sync: SyncConfig,
    pub anchors: AnchorConfig,
    pub layout: LayoutConfig,
    pub logging: LoggingConfig,
}

impl ParallaxConfig {
    /// `<config dir>/parallax/parallax.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parallax").join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    /// Values are returned as written; call [`Self::sanitized`] once logging
    /// is up so its warnings are recorded.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace invalid values with defaults, warning about each section.
    pub fn sanitized(mut self) -> Self {
        if let Err(error) = self.compiler.validate() {
            warn!(section = "compiler", error = %error, "Invalid configuration - using sanitized values");
            self.compiler = self.compiler.sanitized();
        }
        if let Err(error) = self.sync.validate() {
            warn!(section = "sync", error = %error, "Invalid configuration - using sanitized values");
            self.sync = self.sync.sanitized();
        }
        if let Err(error) = self.layout.validate() {
            warn!(section = "layout", error = %error, "Invalid configuration - using sanitized values");
            self.layout = self.layout.sanitized();
        }
        self
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            compiler: self.compiler.clone(),
            sync: self.sync.clone(),
            anchors: self.anchors.clone(),
            layout: self.layout.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_logging::{Level, LogFormat, LogLevel};
    use parallax_types::AliasBinding;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_sections() {
        let file = write_config(
            "[compiler]\nalias_binding = \"original\"\n\n[sync]\nsuppression_window_ms = 400\n\n[layout]\nline_height = 18.0\n",
        );
        let config = ParallaxConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.compiler.alias_binding, AliasBinding::Original);
        assert_eq!(config.sync.suppression_window_ms, 400);
        assert_eq!(config.sync.poll_interval_ms, 120);
        assert_eq!(config.layout.line_height, 18.0);
        assert_eq!(config.anchors, AnchorConfig::default());
    }

    #[test]
    fn test_invalid_values_are_sanitized() {
        let file = write_config("[sync]\npoll_interval_ms = 0\n\n[compiler]\nmax_render_depth = 0\n");
        let config = ParallaxConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.sync.poll_interval_ms, 0);

        let config = config.sanitized();
        assert_eq!(config.sync.poll_interval_ms, 120);
        assert_eq!(config.compiler.max_render_depth, 64);
    }

    #[test]
    fn test_logging_section() {
        let file = write_config(
            "[logging]\nlevel = \"debug\"\nformat = \"json\"\n\n[logging.modules]\nparallax_editor = \"trace\"\n",
        );
        let config = ParallaxConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, LogLevel(Level::DEBUG));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.filter_directives(),
            "debug,parallax_editor=trace"
        );
        assert_eq!(config.compiler, CompilerConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParallaxConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_config("[sync\n");
        let err = ParallaxConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = ParallaxConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ParallaxConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.session_config().layout, LayoutConfig::default());
    }
}
