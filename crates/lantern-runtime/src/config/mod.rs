//! Configuration management.
//!
//! # Sources (lowest to highest priority)
//!
//! 1. Compile-time defaults ([`LanternConfig::default`])
//! 2. `~/.lantern/config.toml`
//! 3. `<project>/.lantern/config.toml`
//! 4. `--config <PATH>`
//! 5. `LANTERN_*` environment variables
//! 6. Command-line flags (applied by the CLI's [`ConfigResolver`])
//!
//! # Example `config.toml`
//!
//! ```toml
//! debug = false
//!
//! [output]
//! encoding = "utf-8"
//! policy = "replace"
//!
//! [engine]
//! # bootstrap_path = "/path/to/brew.lua"
//!
//! [[hooks]]
//! point = "main-ready"
//! lua = "GREETING = 'hello'"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, StaticResolver};
pub use types::{
    EngineConfig, ExecutionConfig, LanternConfig, LoggingConfig, OutputConfig, DEFAULT_ENCODING,
};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".lantern")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".lantern";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
