//! Unified error types for Lookout
//!
//! Classification itself never fails. Everything here belongs to the I/O edge:
//! reading configuration, sshd_config and standards files, and writing reports.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Lookout operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    // sshd_config errors
    #[error("sshd_config file not found at {0}")]
    SshdConfigNotFound(PathBuf),

    #[error("Failed to read sshd_config '{path}': {source}")]
    SshdConfigRead { path: PathBuf, source: io::Error },

    // Standards errors
    #[error("Failed to read standards file '{path}': {source}")]
    StandardsRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse standards file '{path}': {source}")]
    StandardsParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Standard for '{param}' must be a string or number")]
    StandardsValue { param: String },

    #[error("No sshd standards configured (pass a standards file or set [sshd.standards])")]
    StandardsMissing,

    // Output errors
    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type alias for Lookout operations
pub type Result<T> = std::result::Result<T, Error>;
