//! Settings for the control panel, loaded with Figment.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. a TOML file (`hv-control.toml` unless another path is given)
//! 3. environment variables prefixed with `HV_`, nested keys split on `__`
//!    (for example `HV_CONNECTION__ADDRESS=192.168.1.20`)
//!
//! # Example
//! ```no_run
//! use hv_control::config::ControlSettings;
//!
//! let settings = ControlSettings::load_from("hv-control.toml")?;
//! settings.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use hv_core::{ConnectionTarget, Limits};
use hv_driver_mock::MockHvConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hv-control.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Delay between the end of one automatic refresh and the next tick (ms)
    pub poll_interval_ms: u64,
    /// Delay between a completed command and its follow-up refresh (ms)
    pub post_command_refresh_ms: u64,
    /// Start monitoring as soon as a session connects
    pub auto_refresh: bool,
    /// Oldest log lines are dropped past this count
    pub max_log_lines: usize,
    /// Tracing filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    pub limits: Limits,
    /// Initial connection form contents
    pub connection: ConnectionTarget,
    pub simulator: MockHvConfig,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            post_command_refresh_ms: 100,
            auto_refresh: true,
            max_log_lines: 10_000,
            log_level: "info".to_string(),
            limits: Limits::default(),
            connection: ConnectionTarget::default(),
            simulator: MockHvConfig::default(),
        }
    }
}

impl ControlSettings {
    /// Load from [`DEFAULT_CONFIG_FILE`] and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file path. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HV_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn post_command_delay(&self) -> Duration {
        Duration::from_millis(self.post_command_refresh_ms)
    }

    /// Validate settings after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_log_lines == 0 {
            return Err(ConfigError::Invalid(
                "max_log_lines must be greater than 0".to_string(),
            ));
        }

        // Only the bare level form is checked; full directives pass through
        if !self.log_level.contains('=')
            && !VALID_LOG_LEVELS.contains(&self.log_level.as_str())
        {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if !(self.limits.vset_max_volts > 0.0 && self.limits.vset_max_volts.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "limits.vset_max_volts must be positive, got {}",
                self.limits.vset_max_volts
            )));
        }
        if !(self.limits.iset_max_amps > 0.0 && self.limits.iset_max_amps.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "limits.iset_max_amps must be positive, got {}",
                self.limits.iset_max_amps
            )));
        }

        if self.simulator.channels == 0 {
            return Err(ConfigError::Invalid(
                "simulator.channels must be at least 1".to_string(),
            ));
        }
        if self.simulator.load_megaohm <= 0.0 {
            return Err(ConfigError::Invalid(
                "simulator.load_megaohm must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
