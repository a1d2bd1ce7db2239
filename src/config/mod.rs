//! Runtime settings
//!
//! The environment is read exactly once, here, into a [`Settings`] value that
//! is passed explicitly to the translator and the supervisor. An optional
//! TOML file supplies defaults underneath the environment.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    ARPWATCH_BINARY, DEFAULT_DATA_DIR, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY,
    DEFAULT_SHUTDOWN_GRACE, ENV_BINARY, ENV_CONFIG, ENV_DATA_DIR, ENV_INTERFACE, ENV_NETWORK,
    ENV_OPTIONS, ENV_SKIP_PRIVDROP, MAX_POLL_SECS, MAX_SETTLE_SECS, MIN_POLL_SECS,
};
use crate::error::{EntrypointError, Result};
use file::SettingsFile;

/// Everything the translator and supervisor need, resolved at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Raw interface selector, possibly a comma-separated list
    pub interface: Option<String>,
    /// CIDR filter handed to arpwatch unvalidated
    pub network: Option<String>,
    /// Extra tokens appended after the generated flags
    pub extra_options: Vec<String>,
    pub data_dir: PathBuf,
    pub skip_privilege_drop: bool,
    /// Wrapped binary, a bare name is resolved through PATH
    pub binary: String,
    pub timings: SupervisorTimings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupervisorTimings {
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub shutdown_grace: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub settle_delay: Option<f64>,
    pub poll_interval: Option<f64>,
    /// Tokens following `arpwatch` on the command line
    pub trailing_options: Vec<String>,
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env(overrides: &Overrides) -> Result<Self> {
        Self::load(|name| std::env::var(name).ok(), overrides)
    }

    /// Resolve settings through an arbitrary variable lookup
    pub fn load<F>(lookup: F, overrides: &Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| lookup(ENV_CONFIG).map(PathBuf::from));
        let file = match config_path {
            Some(ref path) => {
                log::debug!("Loading settings file {}", path.display());
                SettingsFile::load_from_file(path)?
            }
            None => SettingsFile::default(),
        };

        let interface = lookup(ENV_INTERFACE).or(file.arpwatch.interface);
        let network = lookup(ENV_NETWORK).or(file.arpwatch.network);

        let mut extra_options = tokenize(lookup(ENV_OPTIONS).or(file.arpwatch.options).as_deref());
        extra_options.extend(overrides.trailing_options.iter().cloned());

        let data_dir = lookup(ENV_DATA_DIR)
            .map(PathBuf::from)
            .or(file.arpwatch.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let skip_privilege_drop = match lookup(ENV_SKIP_PRIVDROP) {
            Some(value) => parse_bool(ENV_SKIP_PRIVDROP, &value)?,
            None => file.arpwatch.skip_privilege_drop.unwrap_or(false),
        };

        let binary = lookup(ENV_BINARY)
            .or(file.arpwatch.binary)
            .unwrap_or_else(|| ARPWATCH_BINARY.to_string());

        let defaults = SupervisorTimings::default();
        let timings = SupervisorTimings {
            settle_delay: seconds(
                "settle_delay",
                overrides.settle_delay.or(file.supervisor.settle_delay),
                0.0,
                MAX_SETTLE_SECS,
            )?
            .unwrap_or(defaults.settle_delay),
            poll_interval: seconds(
                "poll_interval",
                overrides.poll_interval.or(file.supervisor.poll_interval),
                MIN_POLL_SECS,
                MAX_POLL_SECS,
            )?
            .unwrap_or(defaults.poll_interval),
            shutdown_grace: seconds(
                "shutdown_grace",
                file.supervisor.shutdown_grace,
                0.0,
                MAX_SETTLE_SECS,
            )?
            .unwrap_or(defaults.shutdown_grace),
        };

        Ok(Self {
            interface,
            network,
            extra_options,
            data_dir,
            skip_privilege_drop,
            binary,
            timings,
        })
    }
}

/// Split an option string on whitespace; no quoting is interpreted
pub fn tokenize(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Parse the boolean spellings accepted in environment variables
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EntrypointError::InvalidSetting {
            name: name.to_string(),
            value: value.to_string(),
            reason: "expected true/false, yes/no, on/off or 1/0".to_string(),
        }),
    }
}

fn seconds(name: &str, value: Option<f64>, min: f64, max: f64) -> Result<Option<Duration>> {
    let Some(secs) = value else {
        return Ok(None);
    };

    if !secs.is_finite() || secs < min || secs > max {
        return Err(EntrypointError::InvalidSetting {
            name: name.to_string(),
            value: secs.to_string(),
            reason: format!("must be between {} and {} seconds", min, max),
        });
    }

    Ok(Some(Duration::from_secs_f64(secs)))
}
