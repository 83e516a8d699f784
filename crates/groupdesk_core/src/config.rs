//! Runtime configuration loaded from JSON.
//!
//! # Invariants
//! - Every field has a default; an empty object is a valid config.
//! - `validate` runs on every load path.

use crate::logging::default_log_level;
use crate::service::admin_service::DEFAULT_MAX_SEED_COUNT;
use crate::service::catalog_service::DEFAULT_PAGE_SIZE;
use crate::validation::ValidationRules;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    /// Parsed values are inconsistent.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file; in-memory database when absent.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; file logging is off when absent.
    pub log_dir: Option<PathBuf>,
    pub validation: ValidationRules,
    pub page_size: u32,
    pub max_seed_count: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            validation: ValidationRules::default(),
            page_size: DEFAULT_PAGE_SIZE,
            max_seed_count: DEFAULT_MAX_SEED_COUNT,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.min_year > self.validation.max_year {
            return Err(ConfigError::Invalid(format!(
                "validation.min_year {} is after validation.max_year {}",
                self.validation.min_year, self.validation.max_year
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        if self.max_seed_count == 0 {
            return Err(ConfigError::Invalid(
                "max_seed_count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
