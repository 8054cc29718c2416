//! Configuration file parsing for Lookout
//!
//! Parses `lookout.toml` configuration files using serde

use crate::error::{Error, Result};
use crate::sickbay::freshness::DEFAULT_WINDOW_HOURS;
use crate::sickbay::RecencyPolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "lookout.toml";

/// Load configuration from a file
pub fn load(path: &Path) -> Result<LookoutConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: LookoutConfig = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

/// Load configuration, falling back to defaults
///
/// An explicitly requested file must exist. The default file is optional.
pub fn load_or_default(path: Option<&Path>) -> Result<LookoutConfig> {
    match path {
        Some(path) => load(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                load(default_path)
            } else {
                debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(LookoutConfig::default())
            }
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookoutConfig {
    /// Scheduled job monitoring
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Container runtime invocation
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// sshd hardening audit
    #[serde(default)]
    pub sshd: SshdConfig,
}

impl LookoutConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.jobs.prefix.trim().is_empty() {
            return Err(Error::ConfigValidation("jobs.prefix must not be empty".into()));
        }

        if self.jobs.window_hours == 0 {
            return Err(Error::ConfigValidation(
                "jobs.window_hours must be at least 1".into(),
            ));
        }

        if self.runtime.binary.trim().is_empty() {
            return Err(Error::ConfigValidation(
                "runtime.binary must not be empty".into(),
            ));
        }

        if self.runtime.timeout == 0 {
            return Err(Error::ConfigValidation(
                "runtime.timeout must be at least 1 second".into(),
            ));
        }

        let retry = &self.runtime.retry;
        if !(0.0..=1.0).contains(&retry.jitter_factor) {
            return Err(Error::ConfigValidation(format!(
                "runtime.retry.jitter_factor must be between 0 and 1, got {}",
                retry.jitter_factor
            )));
        }

        if !(retry.multiplier >= 1.0 && retry.multiplier.is_finite()) {
            return Err(Error::ConfigValidation(format!(
                "runtime.retry.multiplier must be at least 1.0, got {}",
                retry.multiplier
            )));
        }

        Ok(())
    }
}

fn default_prefix() -> String {
    "ansible-job-".into()
}

fn default_window_hours() -> u32 {
    DEFAULT_WINDOW_HOURS
}

/// Scheduled job monitoring settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Container name filter passed to the runtime
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Maximum age in hours for a run to count as recent
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

impl JobsConfig {
    /// Recency policy for this configuration
    pub fn policy(&self) -> Result<RecencyPolicy> {
        RecencyPolicy::new(self.window_hours).ok_or_else(|| {
            Error::ConfigValidation("jobs.window_hours must be at least 1".into())
        })
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            window_hours: default_window_hours(),
        }
    }
}

fn default_binary() -> String {
    "docker".into()
}

fn default_timeout() -> u64 {
    30
}

/// Container runtime settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Runtime CLI (docker or a compatible tool such as podman)
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Timeout for each invocation in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retry/backoff for timed-out invocations
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

// Retry configuration defaults
fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_attempts() -> u8 {
    3
}

fn default_jitter_factor() -> f64 {
    0.25
}

/// Retry/backoff configuration for runtime invocations
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Base delay in milliseconds before first retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds between retries
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,

    /// Jitter factor (0.0-1.0) to randomize delays
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

fn default_sshd_config_path() -> PathBuf {
    PathBuf::from("/etc/ssh/sshd_config")
}

/// sshd audit settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshdConfig {
    /// sshd_config to audit
    #[serde(default = "default_sshd_config_path")]
    pub config_path: PathBuf,

    /// JSON standards document
    pub standards_path: Option<PathBuf>,

    /// Inline standards, used when no standards file is given
    #[serde(default)]
    pub standards: BTreeMap<String, String>,
}

impl Default for SshdConfig {
    fn default() -> Self {
        Self {
            config_path: default_sshd_config_path(),
            standards_path: None,
            standards: BTreeMap::new(),
        }
    }
}
