//! Host configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! term_dumps = ["data/202110.json", "data/202130.json"]
//! employees = "data/employees.json"
//!
//! [logging]
//! filter = "info,course_search::analytics=info"
//! log_dir = "/var/log/searchneu"
//!
//! [search]
//! high_water_mark = 10000
//! index_timeout_ms = 2000
//! ```
//!
//! Every table and field is optional; missing values fall back to defaults.

use std::path::{Path, PathBuf};

use course_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub search: SearchConfig,
}

/// Where the prebuilt datasets live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// One JSON dump per term.
    pub term_dumps: Vec<PathBuf>,
    /// JSON object mapping employee refs to employee records.
    pub employees: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for daily rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// File name prefix of the rolling log files.
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            log_dir: None,
            file_prefix: "searchneu.log".into(),
        }
    }
}

impl HostConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| HostError::Config(e.to_string()))?;
        if let Some(base) = path.parent() {
            config.data.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/searchneu/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("searchneu").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("searchneu")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/searchneu-config/config.toml")
        }
    }

    /// Validate the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] for host-level problems and
    /// [`HostError::Search`] if the `[search]` table is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.data.term_dumps.is_empty() {
            return Err(HostError::Config(
                "data.term_dumps must list at least one term dump".into(),
            ));
        }
        if self.logging.file_prefix.trim().is_empty() {
            return Err(HostError::Config(
                "logging.file_prefix must not be empty".into(),
            ));
        }
        self.search.validate()?;
        Ok(())
    }
}

impl DataConfig {
    /// Relative dataset paths are relative to the config file's directory.
    fn resolve_relative_to(&mut self, base: &Path) {
        for dump in &mut self.term_dumps {
            if dump.is_relative() {
                *dump = base.join(&*dump);
            }
        }
        if let Some(employees) = self.employees.as_mut().filter(|p| p.is_relative()) {
            *employees = base.join(&*employees);
        }
    }
}
