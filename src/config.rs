//! Configuration management for the nesium-cpu runner
//!
//! Runner settings live in a TOML file in the user's config directory.
//! Command-line flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Where the effective configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    /// No config file; built-in defaults.
    Defaults,
    File(PathBuf),
    /// The file exists but could not be used; defaults were taken instead.
    Fallback(PathBuf, ConfigError),
}

impl ConfigSource {
    pub fn report(&self) {
        match self {
            ConfigSource::Defaults => log::debug!("No config file, using defaults"),
            ConfigSource::File(path) => {
                log::info!("Loaded configuration from: {}", path.display())
            }
            ConfigSource::Fallback(path, e) => {
                log::error!("Failed to load config file {}: {}", path.display(), e);
                log::info!("Using default configuration");
            }
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Instruction limit per run; 0 runs until the program halts
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Log a trace line for every instruction
    #[serde(default)]
    pub trace: bool,

    /// Log level filter: "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_steps() -> u64 {
    1_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            trace: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("nesium-cpu").join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Load from the default location. See `load_or_default`.
    pub fn load() -> (Self, ConfigSource) {
        Self::load_or_default(&Self::config_path())
    }

    /// Load `path`, falling back to defaults if the file is missing or
    /// unreadable. Nothing is logged here; the caller reports the source
    /// once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, ConfigSource) {
        if !path.exists() {
            return (Self::default(), ConfigSource::Defaults);
        }
        match Self::load_from(path) {
            Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
            Err(e) => (Self::default(), ConfigSource::Fallback(path.to_path_buf(), e)),
        }
    }

    /// Load from an explicit path. Errors are returned, not papered over.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        log::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
