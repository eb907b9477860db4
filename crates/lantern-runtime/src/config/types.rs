//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use crate::io::{EncodePolicy, EncodingChoice};
use lantern_hook::HooksConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure, after merging all layers.
///
/// # Example
///
/// ```
/// use lantern_runtime::config::LanternConfig;
///
/// let config = LanternConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.output.encoding, "utf-8");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanternConfig {
    /// Enable debug logging.
    pub debug: bool,

    /// Output stream configuration.
    pub output: OutputConfig,

    /// Engine configuration.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Declarative hooks.
    #[serde(flatten)]
    pub hooks: HooksConfig,
}

impl LanternConfig {
    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed or has wrong types.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Fields in `other` override only when they differ from the default.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();
        if other.debug != default.debug {
            self.debug = other.debug;
        }
        self.output.merge(&other.output);
        self.engine.merge(&other.engine);
        self.logging.merge(&other.logging);
        self.hooks.merge(&other.hooks);
    }
}

/// Output stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Requested encoding name.
    pub encoding: String,
    /// Policy for unencodable characters.
    pub policy: EncodePolicy,
}

/// Default output encoding.
pub const DEFAULT_ENCODING: &str = "utf-8";

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            policy: EncodePolicy::default(),
        }
    }
}

impl OutputConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();
        if other.encoding != default.encoding {
            self.encoding.clone_from(&other.encoding);
        }
        if other.policy != default.policy {
            self.policy = other.policy;
        }
    }

    /// Resolves the configured encoding, falling back to UTF-8.
    #[must_use]
    pub fn choice(&self) -> EncodingChoice {
        EncodingChoice::resolve(&self.encoding, DEFAULT_ENCODING)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Load the compiler bootstrap from this file instead of the bundled one.
    pub bootstrap_path: Option<PathBuf>,
}

impl EngineConfig {
    fn merge(&mut self, other: &Self) {
        if other.bootstrap_path.is_some() {
            self.bootstrap_path.clone_from(&other.bootstrap_path);
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (e.g. `"info"`, `"lantern_lua=debug"`).
    pub level: Option<String>,
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        if other.level.is_some() {
            self.level.clone_from(&other.level);
        }
    }

    /// Filter directive: explicit level, else `debug` in debug mode, else `None`.
    #[must_use]
    pub fn directive(&self, debug: bool) -> Option<String> {
        match (&self.level, debug) {
            (Some(level), _) => Some(level.clone()),
            (None, true) => Some("debug".to_string()),
            (None, false) => None,
        }
    }
}

/// Parsed configuration for one process run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Script to execute.
    pub script: PathBuf,
    /// Arguments passed through to the script.
    pub args: Vec<String>,
    /// Directory relative paths in hook definitions resolve against.
    pub base_dir: PathBuf,
    /// Merged settings.
    pub settings: LanternConfig,
}

impl ExecutionConfig {
    /// Creates a config for `script` with default settings.
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            args: Vec::new(),
            base_dir: PathBuf::from("."),
            settings: LanternConfig::default(),
        }
    }

    /// Sets script arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Sets merged settings.
    #[must_use]
    pub fn with_settings(mut self, settings: LanternConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Resolves `path` against [`base_dir`](Self::base_dir).
    #[must_use]
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
