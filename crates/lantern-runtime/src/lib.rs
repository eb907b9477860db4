//! Runtime layer for the lantern script host.
//!
//! - [`config`]: layered configuration (`LanternConfig`, `ConfigLoader`,
//!   `ConfigResolver`, `ExecutionConfig`)
//! - [`io`]: the output safety shim (`EncodingChoice`, `SafeWriter`,
//!   `OutputStreams`)
//! - [`state`]: per-run state (`ExecutionState`, `ReturnCode`)

pub mod config;
pub mod io;
pub mod state;

pub use config::{ConfigError, ConfigLoader, ConfigResolver, ExecutionConfig, LanternConfig};
pub use io::{EncodePolicy, EncodingChoice, OutputStreams, SharedStream};
pub use state::{ExecutionState, ReturnCode};
