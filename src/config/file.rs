//! TOML settings file
//!
//! Every key is optional; environment variables override the file field by field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EntrypointError, Result};

/// Top-level settings file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub arpwatch: ArpwatchSection,
    pub supervisor: SupervisorSection,
}

/// Values that feed the argument translator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArpwatchSection {
    pub interface: Option<String>,
    pub network: Option<String>,
    /// Raw option string, tokenized on whitespace like ARPWATCH_OPTS
    pub options: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub skip_privilege_drop: Option<bool>,
    pub binary: Option<String>,
}

/// Supervisor timings in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorSection {
    /// 0.0-60.0
    pub settle_delay: Option<f64>,
    /// 0.1-300.0
    pub poll_interval: Option<f64>,
    /// 0.0-60.0
    pub shutdown_grace: Option<f64>,
}

impl SettingsFile {
    /// Load and parse a settings file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EntrypointError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|reason| EntrypointError::ConfigFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }
}
