//! Client configuration via `cbbridge.toml`
//!
//! Defaults apply to every field, so an empty file is a valid config. Values
//! are validated eagerly when a file is loaded.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cbbridge_core::{Error, Result};

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "cbbridge.toml";

fn default_management_timeout_ms() -> u64 {
    75_000
}

fn default_query_timeout_ms() -> u64 {
    75_000
}

/// Largest accepted `stream.row_buffer`.
pub const MAX_ROW_BUFFER: usize = 1 << 20;

fn default_row_buffer() -> usize {
    64
}

/// Row stream settings, persisted under `[stream]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    /// Rows buffered between the engine and a slow consumer (default: 64)
    #[serde(default = "default_row_buffer")]
    pub row_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            row_buffer: default_row_buffer(),
        }
    }
}

/// Client configuration loaded from `cbbridge.toml`.
///
/// # Example
///
/// ```toml
/// management_timeout_ms = 75000
/// query_timeout_ms = 75000
///
/// [stream]
/// row_buffer = 64
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Timeout for management operations without their own (default: 75000)
    #[serde(default = "default_management_timeout_ms")]
    pub management_timeout_ms: u64,
    /// Timeout for queries without their own (default: 75000)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Row stream settings
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            management_timeout_ms: default_management_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            stream: StreamConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default management timeout.
    pub fn management_timeout(&self) -> Duration {
        Duration::from_millis(self.management_timeout_ms)
    }

    /// Default query timeout.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout is zero or the row buffer is
    /// outside `1..=MAX_ROW_BUFFER`.
    pub fn validate(&self) -> Result<()> {
        if self.management_timeout_ms == 0 {
            return Err(config_error("management_timeout_ms must be greater than 0"));
        }
        if self.query_timeout_ms == 0 {
            return Err(config_error("query_timeout_ms must be greater than 0"));
        }
        if self.stream.row_buffer == 0 {
            return Err(config_error("stream.row_buffer must be greater than 0"));
        }
        if self.stream.row_buffer > MAX_ROW_BUFFER {
            return Err(config_error(format!(
                "stream.row_buffer must be at most {}, got {}",
                MAX_ROW_BUFFER, self.stream.row_buffer
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# cbbridge client configuration
#
# Timeout for analytics management operations, in milliseconds.
# Applies when an operation does not carry its own timeout.
management_timeout_ms = 75000

# Timeout for queries, in milliseconds.
# Applies when the query options do not set one.
query_timeout_ms = 75000

[stream]
# Rows buffered between the engine and the caller.
# A full buffer makes the engine wait for the caller to catch up.
row_buffer = 64
"#
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| config_error(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            config_error(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config { reason } => config_error(format!("{}: {}", path.display(), reason)),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                config_error(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| config_error(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            config_error(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

fn config_error(reason: impl Into<String>) -> Error {
    Error::Config {
        reason: reason.into(),
    }
}
