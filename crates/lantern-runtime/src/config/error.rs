//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why configuration could not be resolved.
///
/// `Usage` and `Info` carry text already formatted by the argument parser;
/// they are shown verbatim.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file named with `--config` does not exist.
    #[error("config file '{path}' not found")]
    MissingFile { path: PathBuf },

    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `LANTERN_*` variable holds a value of the wrong shape.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: &'static str, message: String },

    #[error("{0}")]
    Usage(String),

    /// `--help` or `--version`: not a failure.
    #[error("{0}")]
    Info(String),
}

impl ConfigError {
    pub(crate) fn env(name: &'static str, message: impl std::fmt::Display) -> Self {
        Self::InvalidEnvVar {
            name,
            message: message.to_string(),
        }
    }
}
