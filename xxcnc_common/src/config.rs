//! TOML configuration loading primitives.
//!
//! Every XXCNC application config embeds a [`SharedConfig`] and is read via
//! the blanket [`ConfigLoader`] trait.
//!
//! ```rust,no_run
//! use xxcnc_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct JogConfig {
//!     shared: SharedConfig,
//!     step_mm: f64,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = JogConfig::load(Path::new("jog.toml"))?;
//!     println!("{} jogs {} mm", config.shared.service_name, config.step_mm);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error returned while reading or validating a configuration file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The file exists but could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),

    /// TOML syntax or schema mismatch.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log verbosity, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Fields common to every XXCNC application config.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "xxcnc-motion-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance identifier used in log output.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "xxcnc-motion".to_string(),
        }
    }
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load any deserializable config type from TOML.
///
/// - `FileNotFound` if the path does not exist
/// - `Io` for other read failures
/// - `ParseError` for TOML syntax or schema errors
///
/// Semantic validation is left to the caller.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::Io(format!("{}: {e}", path.display()))
            }
        })?;
        Self::load_str(&content)
    }

    fn load_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
