//! Process configuration read from the environment.

use std::path::PathBuf;

use rattle_domain::DOCUMENT_FILE_NAME;

use crate::persistence::PREFERENCES_FILE_NAME;

/// Environment variable overriding the data directory.
pub const DATA_DIR_VAR: &str = "RATTLE_DATA_DIR";

/// Environment variable holding the log filter.
pub const LOG_FILTER_VAR: &str = "RATTLE_LOG";

/// Log filter used when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No data directory is configured and the platform has none.
    #[error("no data directory available; set {DATA_DIR_VAR}")]
    NoDataDir,
}

/// Where the application keeps its files and how it logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the document and preferences files
    pub data_dir: PathBuf,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl AppConfig {
    /// Creates a config for the given data directory with the default filter.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Reads the config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDataDir` if no data directory can be found.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the config through `lookup`.
    ///
    /// The data directory defaults to `<platform data dir>/rattle`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDataDir` if no data directory can be found.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match lookup(DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join("rattle"))
                .ok_or(ConfigError::NoDataDir)?,
        };
        let log_filter = lookup(LOG_FILTER_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            data_dir,
            log_filter,
        })
    }

    /// Path of the requests and groups document.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE_NAME)
    }

    /// Path of the preferences file.
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE_NAME)
    }
}
