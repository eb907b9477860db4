//! Application-level error type.
//!
//! [`AppError`] unifies the hook, config and engine errors that can abort a
//! run before or around the script.

use lantern_hook::{HookDefValidationError, HookError};
use lantern_lua::EngineError;
use lantern_runtime::ConfigError;
use thiserror::Error;

/// Exit status for usage errors.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Exit status for every other start-up failure.
pub const STARTUP_EXIT_CODE: i32 = 1;

/// Unified application error.
///
/// # Example
///
/// ```
/// use lantern_app::AppError;
/// use lantern_hook::HookError;
///
/// let hook_err = HookError::action_failed("main-ready", "preload", "boom");
/// let app_err: AppError = hook_err.into();
///
/// assert_eq!(app_err.code(), "APP_HOOK_FAILED");
/// eprintln!("Error: {}", app_err);
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// A hook action failed while its point was fired.
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// A declarative hook from the config file is malformed.
    #[error("Invalid hook definition: {0}")]
    HookDef(#[from] HookDefValidationError),

    /// Engine construction or script loading failed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration could not be resolved.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hook(_) => "APP_HOOK_FAILED",
            Self::HookDef(_) => "APP_HOOK_INVALID",
            Self::Engine(EngineError::ScriptRead { .. }) => "APP_SCRIPT_UNREADABLE",
            Self::Engine(_) => "APP_ENGINE_ERROR",
            Self::Config(ConfigError::Usage(_)) => "APP_USAGE",
            Self::Config(ConfigError::Info(_)) => "APP_INFO",
            Self::Config(_) => "APP_CONFIG_ERROR",
            Self::Io(_) => "APP_IO_ERROR",
        }
    }

    /// `true` for `--help`/`--version` style output, which is not a failure.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::Config(ConfigError::Info(_)))
    }

    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::Info(_)) => 0,
            Self::Config(ConfigError::Usage(_)) => USAGE_EXIT_CODE,
            _ => STARTUP_EXIT_CODE,
        }
    }
}
