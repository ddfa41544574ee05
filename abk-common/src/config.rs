//! Bootstrap configuration loading and config file resolution
//!
//! The player reads a small TOML file at startup:
//!
//! ```toml
//! catalog_path = "catalog.toml"
//! initial_rate = 1.0
//! tick_interval_ms = 100
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional. A missing file is not fatal: the loader warns and
//! falls back to built-in defaults.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `ABK_CONFIG`
//! 3. User config file (`<config dir>/abk/config.toml`)
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ABK_CONFIG";

/// Default progress tick cadence of the transport
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Catalog manifest path. Relative paths resolve against the config file
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Playback speed used when the player starts
    #[serde(default = "default_initial_rate")]
    pub initial_rate: f32,

    /// Interval between transport progress events
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this config was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_initial_rate() -> f32 {
    1.0
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            initial_rate: default_initial_rate(),
            tick_interval_ms: default_tick_interval_ms(),
            logging: LoggingConfig::default(),
            source: None,
        }
    }
}

impl TomlConfig {
    /// Parse and validate config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.initial_rate.is_finite() || self.initial_rate <= 0.0 {
            return Err(Error::Config(format!(
                "initial_rate must be positive, got {}",
                self.initial_rate
            )));
        }
        Ok(())
    }

    /// Catalog path with relative paths anchored at the config file's directory
    pub fn resolved_catalog_path(&self) -> Option<PathBuf> {
        let path = self.catalog_path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        match self.source.as_ref().and_then(|source| source.parent()) {
            Some(dir) => Some(dir.join(path)),
            None => Some(path.clone()),
        }
    }
}

/// Pick the config file to read, following the priority order above.
///
/// Returns `None` when no explicit path is given and no user config file
/// exists, in which case built-in defaults apply.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file
    let user_config = dirs::config_dir().map(|d| d.join("abk").join("config.toml"))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        debug!("No user config at {}", user_config.display());
        None
    }
}

/// Resolve and load the bootstrap configuration.
///
/// A resolved path that does not exist logs a warning and yields defaults.
/// A file that exists but fails to parse or validate is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::from_file(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.initial_rate, 1.0);
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.logging.level, "info");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = TomlConfig::from_toml_str(
            r#"
            catalog_path = "books/catalog.toml"
            initial_rate = 1.5
            tick_interval_ms = 250

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog_path, Some(PathBuf::from("books/catalog.toml")));
        assert_eq!(config.initial_rate, 1.5);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let result = TomlConfig::from_toml_str("tick_interval_ms = 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let result = TomlConfig::from_toml_str("initial_rate = 0.0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_relative_catalog_anchored_at_source() {
        let config = TomlConfig {
            catalog_path: Some(PathBuf::from("catalog.toml")),
            source: Some(PathBuf::from("/etc/abk/config.toml")),
            ..TomlConfig::default()
        };
        assert_eq!(
            config.resolved_catalog_path(),
            Some(PathBuf::from("/etc/abk/catalog.toml"))
        );
    }

    #[test]
    fn test_absolute_catalog_unchanged() {
        let config = TomlConfig {
            catalog_path: Some(PathBuf::from("/srv/catalog.toml")),
            source: Some(PathBuf::from("/etc/abk/config.toml")),
            ..TomlConfig::default()
        };
        assert_eq!(
            config.resolved_catalog_path(),
            Some(PathBuf::from("/srv/catalog.toml"))
        );
    }
}
