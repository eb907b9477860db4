//! Lantern Application Layer.
//!
//! This crate provides:
//!
//! - **[`App`] → [`ConfiguredApp`] → [`RunOutcome`]**: the execution
//!   controller
//! - **[`AppError`]**: unified application-level error type
//! - **Config hooks**: `[[hooks]]` entries turned into engine actions
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Foundation Layer                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  lantern-hook (registry, plugins, hook definitions)         │
//! │  lantern-runtime (config, execution state, output shim)     │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Engine Layer                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  lantern-lua (session, Brew bridge, host API, event loop)   │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Application Layer  ◄── HERE                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  lantern-app (controller + AppError)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Frontend Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  lantern-cli (argv → ConfigResolver, exit status)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Handling Strategy
//!
//! ```text
//! Internal Errors (HookError, ConfigError, EngineError)
//!                    ↓ From impl
//!               AppError (this crate)
//!                    ↓ exit_code() / eprintln
//!               CLI output
//! ```
//!
//! Script errors never become `AppError`: they are written to stderr and
//! surface as the run's exit code.

mod app;
mod error;
pub mod hooks;

pub use app::{App, ConfiguredApp, Phase, RunOutcome};
pub use error::{AppError, STARTUP_EXIT_CODE, USAGE_EXIT_CODE};

pub use lantern_hook::{HookPoint, HookRegistry, PluginSet, TracePlugin};
pub use lantern_lua::{EngineError, ScriptStatus};
pub use lantern_runtime::{ConfigError, ConfigResolver, ExecutionConfig, OutputStreams};
