//! Settings for the command line tool.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// LogFormat selects the formatter of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings holds the tool's configurable defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// An `EnvFilter` directive, e.g. `info` or `podpreset=debug`.
    pub log_filter: String,

    pub log_format: LogFormat,

    /// Namespace assumed for pods and presets that declare none.
    pub namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
            namespace: "default".to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Settings, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Settings::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
