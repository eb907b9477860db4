//! Hook system for the lantern script host.
//!
//! # Overview
//!
//! A hook is a named lifecycle point. Zero or more [`Action`]s are
//! registered against a name and invoked synchronously, in registration
//! order, whenever that name is fired.
//!
//! ```text
//! process start ──► fire("process-starting") ──► parse config
//!                                                     │
//!                          run script ◄── fire("main-ready")
//! ```
//!
//! # Core Concepts
//!
//! - [`HookPoint`]: the two points the controller fires.
//! - [`Action`]: a no-argument callable; [`FnAction`] adapts closures.
//! - [`HookRegistry`]: name → ordered actions; `register` and `fire`.
//! - [`Plugin`] / [`PluginSet`]: explicit registration routines the
//!   controller installs before the first firing.
//! - [`HooksConfig`] / [`HookDef`]: declarative hooks from the config file.
//!
//! # Failure semantics
//!
//! An action error is not caught by the registry. `fire` returns it to the
//! caller; actions registered before the failing one have already run.
//!
//! # Example
//!
//! ```
//! use lantern_hook::{FnAction, HookPoint, HookRegistry};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut registry = HookRegistry::new();
//!
//! let l = Rc::clone(&log);
//! registry.register(
//!     HookPoint::ProcessStarting,
//!     Box::new(FnAction::new("started", move || {
//!         l.borrow_mut().push("started");
//!         Ok(())
//!     })),
//! );
//!
//! registry.fire("process-starting").unwrap();
//! assert_eq!(*log.borrow(), vec!["started"]);
//!
//! // Nothing registered → no-op
//! assert_eq!(registry.fire("unknown").unwrap(), 0);
//! ```

mod action;
mod config;
mod error;
mod plugin;
mod point;
mod registry;

pub use action::{Action, FnAction};
pub use config::{HookDef, HookDefValidationError, HookHandler, HooksConfig};
pub use error::HookError;
pub use plugin::{Plugin, PluginSet, TracePlugin};
pub use point::HookPoint;
pub use registry::HookRegistry;

// Re-export testing utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! Test utilities for the hook system.
    //!
    //! Provides [`MockAction`] for use in tests.
    pub use crate::action::testing::{call_log, CallLog, MockAction};
}
