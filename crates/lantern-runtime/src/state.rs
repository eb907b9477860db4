//! Per-run execution state.

use crate::config::ExecutionConfig;
use std::cell::Cell;
use std::rc::Rc;

/// Exit code used when the script never sets one.
pub const DEFAULT_EXIT_CODE: i32 = 0;

/// Shared return-code cell.
///
/// Starts unset. The host API writes it when a script calls
/// `lantern.exit(code)`; the controller reads it at termination.
/// Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct ReturnCode {
    code: Rc<Cell<Option<i32>>>,
    exit_requested: Rc<Cell<bool>>,
}

impl ReturnCode {
    /// Creates an unset cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `code` and marks that the script asked to exit.
    pub fn request_exit(&self, code: i32) {
        self.code.set(Some(code));
        self.exit_requested.set(true);
    }

    /// Records `code` only if nothing was recorded yet.
    pub fn set_if_unset(&self, code: i32) {
        if self.code.get().is_none() {
            self.code.set(Some(code));
        }
    }

    /// The recorded code, if any.
    #[must_use]
    pub fn get(&self) -> Option<i32> {
        self.code.get()
    }

    /// `true` once the script has requested exit.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.get()
    }

    /// The recorded code, or [`DEFAULT_EXIT_CODE`].
    #[must_use]
    pub fn resolve(&self) -> i32 {
        self.code.get().unwrap_or(DEFAULT_EXIT_CODE)
    }
}

/// State for one process run.
#[derive(Debug)]
pub struct ExecutionState {
    config: ExecutionConfig,
    return_code: ReturnCode,
    ran: bool,
}

impl ExecutionState {
    /// Creates state for `config` with an unset return code.
    #[must_use]
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            return_code: ReturnCode::new(),
            ran: false,
        }
    }

    /// Parsed configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Shared return-code cell.
    #[must_use]
    pub fn return_code(&self) -> &ReturnCode {
        &self.return_code
    }

    /// `true` once the script has started.
    #[must_use]
    pub fn ran(&self) -> bool {
        self.ran
    }

    /// Marks that the script has started.
    pub fn mark_ran(&mut self) {
        self.ran = true;
    }

    /// Final exit code.
    #[must_use]
    pub fn finalize(&self) -> i32 {
        self.return_code.resolve()
    }
}
