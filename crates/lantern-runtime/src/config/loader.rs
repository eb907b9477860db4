//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.lantern/config.toml`)
//! 3. Project config (`.lantern/config.toml` under the project root)
//! 4. Explicit config file (`--config`), which must exist
//! 5. Environment variables (`LANTERN_*`)
//!
//! Each layer overrides the previous.

use super::{
    default_config_path, ConfigError, LanternConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE,
};
use crate::io::EncodePolicy;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```ignore
/// use lantern_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .skip_env_vars()  // For testing
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.lantern/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    /// Explicit config file.
    explicit: Option<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,

    /// Skip global config loading.
    skip_global: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.lantern/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Adds an explicit config file layered above the project config.
    ///
    /// Unlike the other layers, a missing explicit file is an error.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read
    /// or parsed, if the explicit file is missing, or if an environment
    /// variable holds an invalid value.
    pub fn load(&self) -> Result<LanternConfig, ConfigError> {
        let mut config = LanternConfig::default();

        // Layer 1: Global config
        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = self.load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        // Layer 2: Project config
        if let Some(ref project_root) = self.project_root {
            let project_config_path = project_root
                .join(PROJECT_CONFIG_DIR)
                .join(PROJECT_CONFIG_FILE);

            if let Some(project_config) = self.load_file(&project_config_path)? {
                debug!(path = %project_config_path.display(), "Loaded project config");
                config.merge(&project_config);
            }
        }

        // Layer 3: Explicit config file
        if let Some(ref path) = self.explicit {
            let explicit = self
                .load_file(path)?
                .ok_or_else(|| ConfigError::MissingFile { path: path.clone() })?;
            debug!(path = %path.display(), "Loaded explicit config");
            config.merge(&explicit);
        }

        // Layer 4: Environment variables
        if !self.skip_env {
            apply_env_vars(&mut config, |name| std::env::var(name).ok())?;
        }

        Ok(config)
    }

    /// Loads a config file, returning None if it doesn't exist.
    fn load_file(&self, path: &Path) -> Result<Option<LanternConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = LanternConfig::from_toml(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }
}

/// Applies `LANTERN_*` overrides read through `get`.
fn apply_env_vars(
    config: &mut LanternConfig,
    get: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = get("LANTERN_DEBUG") {
        config.debug = parse_bool(&val)
            .ok_or_else(|| ConfigError::env("LANTERN_DEBUG", "expected bool"))?;
    }

    if let Some(val) = get("LANTERN_OUTPUT_ENCODING") {
        config.output.encoding = val;
    }

    if let Some(val) = get("LANTERN_OUTPUT_POLICY") {
        config.output.policy = val
            .parse::<EncodePolicy>()
            .map_err(|e| ConfigError::env("LANTERN_OUTPUT_POLICY", e))?;
    }

    if let Some(val) = get("LANTERN_BOOTSTRAP") {
        config.engine.bootstrap_path = Some(PathBuf::from(val));
    }

    Ok(())
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off" (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create config dir");
        }
        fs::write(&path, body).expect("write config");
        path
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new().skip_global_config().skip_env_vars()
    }

    #[test]
    fn defaults_without_files() {
        let tmp = TempDir::new().expect("tempdir");
        let cfg = isolated().with_project_root(tmp.path()).load().expect("load");
        assert_eq!(cfg, LanternConfig::default());
    }

    #[test]
    fn project_config_is_loaded() {
        let tmp = TempDir::new().expect("tempdir");
        write_config(tmp.path(), ".lantern/config.toml", "debug = true\n");
        let cfg = isolated().with_project_root(tmp.path()).load().expect("load");
        assert!(cfg.debug);
    }

    #[test]
    fn explicit_overrides_project_and_global() {
        let tmp = TempDir::new().expect("tempdir");
        let global = write_config(tmp.path(), "global.toml", "[output]\nencoding = \"ascii\"\n");
        write_config(tmp.path(), ".lantern/config.toml", "[output]\nencoding = \"latin-1\"\n");
        let explicit = write_config(tmp.path(), "run.toml", "[output]\npolicy = \"escape\"\n");

        let cfg = ConfigLoader::new()
            .with_global_config(global)
            .with_project_root(tmp.path())
            .with_config_file(explicit)
            .skip_env_vars()
            .load()
            .expect("load");

        assert_eq!(cfg.output.encoding, "latin-1");
        assert_eq!(cfg.output.policy, EncodePolicy::Escape);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let err = isolated()
            .with_config_file(tmp.path().join("nope.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn malformed_file_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        write_config(tmp.path(), ".lantern/config.toml", "debug = [unclosed");
        let err = isolated().with_project_root(tmp.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("LANTERN_DEBUG", "yes"),
            ("LANTERN_OUTPUT_ENCODING", "ascii"),
            ("LANTERN_OUTPUT_POLICY", "utf-8"),
            ("LANTERN_BOOTSTRAP", "/tmp/brew.lua"),
        ]
        .into_iter()
        .collect();

        let mut cfg = LanternConfig::default();
        apply_env_vars(&mut cfg, |k| vars.get(k).map(|v| (*v).to_string())).expect("apply");

        assert!(cfg.debug);
        assert_eq!(cfg.output.encoding, "ascii");
        assert_eq!(cfg.output.policy, EncodePolicy::Utf8);
        assert_eq!(cfg.engine.bootstrap_path, Some(PathBuf::from("/tmp/brew.lua")));
    }

    #[test]
    fn invalid_env_bool_is_error() {
        let mut cfg = LanternConfig::default();
        let err = apply_env_vars(&mut cfg, |k| (k == "LANTERN_DEBUG").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if *name == "LANTERN_DEBUG")
        );
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
