//! Error types for engine operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the engine bridge.
///
/// A compile failure reported by the bootstrap is *not* an `EngineError`;
/// it comes back as [`Conversion::Failed`](crate::Conversion::Failed).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Lua runtime error.
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// No bundled bootstrap with this logical name.
    #[error("bootstrap not found: {0}")]
    BootstrapMissing(String),

    /// Bootstrap evaluated but did not yield a usable compiler module.
    #[error("invalid bootstrap: {0}")]
    BootstrapInvalid(String),

    /// Bootstrap file could not be read.
    #[error("failed to read bootstrap {path}: {source}")]
    BootstrapRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Script file could not be read.
    #[error("failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler returned something other than text.
    #[error("compiler returned {0} instead of a string")]
    Protocol(String),
}

/// Extracts a readable message from a Lua error.
pub(crate) fn describe(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(msg) => match msg.find("\nstack traceback:") {
            Some(end) => msg[..end].to_string(),
            None => msg.clone(),
        },
        mlua::Error::CallbackError { cause, .. } => describe(cause),
        mlua::Error::WithContext { cause, .. } => describe(cause),
        mlua::Error::SyntaxError { message, .. } => format!("syntax error: {message}"),
        mlua::Error::ExternalError(inner) => inner.to_string(),
        _ => err.to_string(),
    }
}
