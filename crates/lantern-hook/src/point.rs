//! Hook lifecycle points.
//!
//! The two points the controller fires. The registry itself keys actions by
//! plain strings, so external code may fire and register arbitrary names;
//! these are the ones the start-up sequence reaches.

use crate::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle points fired by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPoint {
    /// Fired once when the process starts, before configuration is parsed.
    ProcessStarting,
    /// Fired once after configuration is parsed, before the script runs.
    MainReady,
}

impl HookPoint {
    /// All points in firing order.
    pub const ALL: &'static [HookPoint] = &[Self::ProcessStarting, Self::MainReady];

    /// Returns the canonical hook name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProcessStarting => "process-starting",
            Self::MainReady => "main-ready",
        }
    }
}

impl AsRef<str> for HookPoint {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for HookPoint {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process-starting" => Ok(Self::ProcessStarting),
            "main-ready" => Ok(Self::MainReady),
            _ => Err(HookError::UnknownHookPoint(s.to_string())),
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
