//! Hook configuration — declarative hook definitions.
//!
//! These types are embedded in the lantern config file. Each definition
//! becomes an action registered after configuration is parsed, so only
//! points that fire after that moment are accepted.
//!
//! # Example TOML
//!
//! ```toml
//! [[hooks]]
//! id = "preload"
//! point = "main-ready"
//! script = "hooks/preload.lua"
//!
//! [[hooks]]
//! point = "main-ready"
//! lua = "GREETING = 'hello'"
//! ```

use crate::{HookError, HookPoint};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Top-level hooks configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HooksConfig {
    /// Declarative hook definitions.
    pub hooks: Vec<HookDef>,
}

/// A single declarative hook definition.
///
/// Either `script` or `lua` must be specified (but not both).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookDef {
    /// Action ID. Generated from the position if not specified.
    pub id: Option<String>,

    /// Hook point name (e.g., "main-ready").
    pub point: String,

    /// Path to a Lua file run in the engine session.
    pub script: Option<String>,

    /// Inline Lua chunk run in the engine session.
    pub lua: Option<String>,

    /// Whether the hook is enabled. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The handler body of a validated [`HookDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookHandler {
    /// Lua file path.
    Script(String),
    /// Inline Lua source.
    Inline(String),
}

/// Errors from validating a `HookDef`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookDefValidationError {
    /// Neither `script` nor `lua` is specified.
    #[error("hook '{label}': neither 'script' nor 'lua' specified")]
    NoHandler { label: String },

    /// Both `script` and `lua` are specified.
    #[error("hook '{label}': both 'script' and 'lua' specified (use one)")]
    BothHandlers { label: String },

    /// Invalid hook point string.
    #[error("hook '{label}': {source}")]
    InvalidPoint { label: String, source: HookError },

    /// The point fires before configuration exists.
    #[error("hook '{label}': '{point}' fires before configuration is loaded")]
    TooEarly { label: String, point: HookPoint },
}

impl HookDef {
    /// Label used in diagnostics.
    #[must_use]
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<anonymous>")
    }

    /// Validates this hook definition and returns its point and handler.
    ///
    /// Checks:
    /// - Exactly one of `script` or `lua` is specified
    /// - `point` is a known hook point
    /// - `point` is not `process-starting`
    pub fn validate(&self) -> Result<(HookPoint, HookHandler), HookDefValidationError> {
        let label = self.label().to_string();

        let handler = match (&self.script, &self.lua) {
            (None, None) => return Err(HookDefValidationError::NoHandler { label }),
            (Some(_), Some(_)) => return Err(HookDefValidationError::BothHandlers { label }),
            (Some(path), None) => HookHandler::Script(path.clone()),
            (None, Some(src)) => HookHandler::Inline(src.clone()),
        };

        let point = HookPoint::from_str(&self.point).map_err(|e| {
            HookDefValidationError::InvalidPoint {
                label: label.clone(),
                source: e,
            }
        })?;

        if point == HookPoint::ProcessStarting {
            return Err(HookDefValidationError::TooEarly { label, point });
        }

        Ok((point, handler))
    }
}

impl HooksConfig {
    /// Merges another config into this one.
    ///
    /// Hook definitions accumulate across config layers.
    pub fn merge(&mut self, other: &Self) {
        self.hooks.extend(other.hooks.iter().cloned());
    }

    /// Enabled definitions with their positional index.
    pub fn enabled(&self) -> impl Iterator<Item = (usize, &HookDef)> {
        self.hooks.iter().enumerate().filter(|(_, d)| d.enabled)
    }
}
