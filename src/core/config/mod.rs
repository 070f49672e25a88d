//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, first hit wins:
//! 1. `$GHFS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ghfs/config.toml`
//! 3. `~/.ghfs/config.toml`
//!
//! Tokens are never read from config; they are passed to the forge
//! explicitly.
//!
//! # Example
//!
//! ```no_run
//! use ghfs::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Branch: {}", config.branch());
//! println!("API: {}", config.api_base());
//! ```

pub mod schema;

pub use schema::{ConfigFile, LogConfig, RemoteConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::forge::github::DEFAULT_API_BASE;

/// Branch mounted when none is configured.
pub const DEFAULT_BRANCH: &str = "main";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with accessor defaults applied.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: ConfigFile,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    /// A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GHFS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ghfs/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".ghfs/config.toml"))
            .filter(|path| path.exists())
    }

    fn remote(&self) -> Option<&RemoteConfig> {
        self.file.remote.as_ref()
    }

    /// Configured repository owner.
    pub fn owner(&self) -> Option<&str> {
        self.remote().and_then(|r| r.owner.as_deref())
    }

    /// Configured repository name.
    pub fn repo(&self) -> Option<&str> {
        self.remote().and_then(|r| r.repo.as_deref())
    }

    /// Branch to mount. Defaults to "main".
    pub fn branch(&self) -> &str {
        self.remote()
            .and_then(|r| r.branch.as_deref())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// REST API base URL. Defaults to the public GitHub API.
    pub fn api_base(&self) -> &str {
        self.remote()
            .and_then(|r| r.api_base.as_deref())
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// Default log level. Defaults to "warn".
    pub fn log_level(&self) -> &str {
        self.file
            .log
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("warn")
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
