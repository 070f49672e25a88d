//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [remote]
//! owner = "octocat"
//! repo = "site"
//! branch = "main"
//! api_base = "https://github.example.com/api/v3"
//!
//! [log]
//! level = "debug"
//! ```
//!
//! # Validation
//!
//! Config values are validated after parsing (the branch must be a valid
//! branch name, owner and repo must be non-empty).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Remote repository binding
    pub remote: Option<RemoteConfig>,

    /// Logging defaults
    pub log: Option<LogConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        if let Some(log) = &self.log {
            log.validate()?;
        }
        Ok(())
    }
}

/// Which repository and branch to mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Repository owner (user or organization)
    pub owner: Option<String>,

    /// Repository name
    pub repo: Option<String>,

    /// Branch to mount (default: "main")
    pub branch: Option<String>,

    /// API base URL, for GitHub Enterprise
    pub api_base: Option<String>,
}

impl RemoteConfig {
    /// Validate the remote binding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("owner", &self.owner), ("repo", &self.repo)] {
            if let Some(value) = value {
                if value.is_empty() || value.contains('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "invalid {field} '{value}'"
                    )));
                }
            }
        }

        if let Some(branch) = &self.branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid branch name: {}", e))
            })?;
        }

        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base must be an http(s) URL, got '{api_base}'"
                )));
            }
        }

        Ok(())
    }
}

/// Logging defaults, overridden by `RUST_LOG` and `--debug`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error, off
    pub level: Option<String>,
}

impl LogConfig {
    /// Valid log levels.
    pub const VALID_LEVELS: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "error", "off"];

    /// Validate the logging configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if !Self::VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log level '{}', must be one of: {}",
                    level,
                    Self::VALID_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
