//! Configuration for the bridge.
//!
//! TOML-based configuration file loading. The default path is
//! `~/.config/ttybridge/config.toml`; a missing file just yields the
//! defaults. Environment variables (`TTYBRIDGE_*`) override file values,
//! and CLI flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use protocol::{HEADER_LEN, MAX_PAYLOAD_LEN};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("terminal size must be non-zero, got {rows}x{cols}")]
    InvalidTerminalSize { rows: u16, cols: u16 },

    #[error("max_buffer_bytes must be at least 65538 (one maximal frame), got {0}")]
    ControlBufferTooSmall(usize),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Smallest usable control buffer: one frame with a maximal payload must
/// be able to complete, otherwise a legal stream could trip the overflow
/// guard.
pub const MIN_CONTROL_BUFFER: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// Default cap on buffered, unparsed control bytes (1 MiB).
const DEFAULT_MAX_CONTROL_BUFFER: usize = 1024 * 1024;

/// Main configuration structure for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: LogLevel,

    /// Initial terminal geometry for the child's pty.
    pub terminal: TerminalConfig,

    /// Control-stream limits.
    pub control: ControlConfig,
}

/// Wrapper so the top-level key can default cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

/// Initial pty geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminalConfig {
    /// Terminal height in rows.
    pub rows: u16,
    /// Terminal width in columns.
    pub cols: u16,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Limits on the control input stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    /// Maximum number of buffered, unparsed control bytes before the run
    /// is failed. Guards against a frame header declaring a length the
    /// sender never delivers.
    pub max_buffer_bytes: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_CONTROL_BUFFER,
        }
    }
}

impl Config {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from the default path, or fall back to defaults when no file
    /// exists.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `TTYBRIDGE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TTYBRIDGE_LOG_LEVEL") {
            self.log_level = LogLevel(level);
        }
        if let Ok(rows) = std::env::var("TTYBRIDGE_ROWS") {
            if let Ok(rows) = rows.parse() {
                self.terminal.rows = rows;
            }
        }
        if let Ok(cols) = std::env::var("TTYBRIDGE_COLS") {
            if let Ok(cols) = cols.parse() {
                self.terminal.cols = cols;
            }
        }
        if let Ok(max) = std::env::var("TTYBRIDGE_MAX_BUFFER") {
            if let Ok(max) = max.parse() {
                self.control.max_buffer_bytes = max;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.0.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.0.clone()));
        }
        if self.terminal.rows == 0 || self.terminal.cols == 0 {
            return Err(ConfigError::InvalidTerminalSize {
                rows: self.terminal.rows,
                cols: self.terminal.cols,
            });
        }
        if self.control.max_buffer_bytes < MIN_CONTROL_BUFFER {
            return Err(ConfigError::ControlBufferTooSmall(
                self.control.max_buffer_bytes,
            ));
        }
        Ok(())
    }
}

/// Default configuration file path: `~/.config/ttybridge/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ttybridge")
        .join("config.toml")
}
