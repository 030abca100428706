//! Session configuration parsing, validation, and environment overrides.

use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Environment variable naming a TOML config file.
pub const CONFIG_PATH_ENV: &str = "RUNSTOP_CONFIG";
/// Environment variable overriding [`RunstopConfig::host`].
pub const HOST_ENV: &str = "RUNSTOP_HOST";
/// Environment variable overriding [`RunstopConfig::start_port`].
pub const PORT_ENV: &str = "RUNSTOP_PORT";

/// Limits applied by the default value formatter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FormatConfig {
    /// Nesting levels shown below the top-level value; `0` shows only the top level.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Array elements rendered before the remainder is summarized.
    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            max_array_length: default_max_array_length(),
        }
    }
}

fn default_depth() -> usize {
    4
}

fn default_max_array_length() -> usize {
    100
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_start_port() -> u16 {
    3000
}

fn default_detach_grace_ms() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

/// Configuration for one [`Runstop`](crate::Runstop) session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RunstopConfig {
    /// Address the observer listener binds to.
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// First port probed; `0` lets the OS pick one.
    #[serde(default = "default_start_port")]
    pub start_port: u16,
    /// Delay between the `stopped` broadcast and listener shutdown.
    #[serde(default = "default_detach_grace_ms")]
    pub detach_grace_ms: u64,
    /// Print the listener URL and shutdown line to stderr.
    #[serde(default = "default_true")]
    pub announce: bool,
    /// Value formatter limits.
    #[serde(default)]
    pub format: FormatConfig,
}

impl Default for RunstopConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            start_port: default_start_port(),
            detach_grace_ms: default_detach_grace_ms(),
            announce: true,
            format: FormatConfig::default(),
        }
    }
}

impl RunstopConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, contains
    /// invalid TOML, or fails validation.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the process environment.
    ///
    /// Starts from the file named by `RUNSTOP_CONFIG` (or the defaults when
    /// unset), then applies `RUNSTOP_HOST` and `RUNSTOP_PORT`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file is invalid or an override
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load_from_path(path)?,
            _ => Self::default(),
        };

        if let Ok(host) = env::var(HOST_ENV) {
            config.host = host
                .parse()
                .map_err(|err| AppError::Config(format!("invalid {HOST_ENV} '{host}': {err}")))?;
        }
        if let Ok(port) = env::var(PORT_ENV) {
            config.start_port = port
                .parse()
                .map_err(|err| AppError::Config(format!("invalid {PORT_ENV} '{port}': {err}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Grace delay as a [`Duration`].
    #[must_use]
    pub fn detach_grace(&self) -> Duration {
        Duration::from_millis(self.detach_grace_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.format.max_array_length == 0 {
            return Err(AppError::Config(
                "format.max_array_length must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
