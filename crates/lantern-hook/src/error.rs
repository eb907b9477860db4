//! Error types for the hook system.

use thiserror::Error;

/// Errors that can occur in the hook system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// Unknown hook point string.
    #[error("unknown hook point: {0}")]
    UnknownHookPoint(String),

    /// An action failed while its hook was being fired.
    #[error("hook action failed [{action_id}] at '{hook}': {message}")]
    ActionFailed {
        /// Hook name being fired.
        hook: String,
        /// ID of the action that failed.
        action_id: String,
        /// Error message.
        message: String,
    },

    /// A plugin could not register its actions.
    #[error("plugin '{plugin}' failed to register: {message}")]
    PluginFailed {
        /// Plugin name.
        plugin: String,
        /// Error message.
        message: String,
    },
}

impl HookError {
    /// Creates an action failure.
    pub fn action_failed(
        hook: impl Into<String>,
        action_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ActionFailed {
            hook: hook.into(),
            action_id: action_id.into(),
            message: message.into(),
        }
    }
}
