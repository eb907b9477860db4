//! Script execution.
//!
//! ```text
//! ScriptRunner::new ──► install host API
//! ScriptRunner::run
//!   ├── read script
//!   ├── *.brew ──► convert ──► Failed → stderr diagnostic, code 1
//!   ├── exec main chunk
//!   └── EventLoop::run until idle or exit
//! ```
//!
//! An uncaught error is reported on stderr as `Error: <message>` and the
//! return code becomes 1 unless the script already chose one.

use crate::error::{describe, EngineError};
use crate::event_loop::EventLoop;
use crate::host::{self, HostContext};
use crate::session::{Conversion, EngineSession};
use std::path::Path;
use std::rc::Rc;

/// Exit code for a script that failed.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// How the script is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Plain Lua.
    Lua,
    /// Brew source, converted before running.
    Brew,
}

impl ScriptKind {
    /// Kind from the file extension (`.brew` is Brew, anything else Lua).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("brew") => Self::Brew,
            _ => Self::Lua,
        }
    }
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Main chunk and every callback ran to completion.
    Completed,
    /// The script called `lantern.exit`.
    Exited,
    /// Brew conversion of the main script failed.
    ConversionFailed(String),
    /// An uncaught error escaped the script.
    Failed(String),
}

/// Runs one script inside an [`EngineSession`].
#[derive(Debug)]
pub struct ScriptRunner {
    session: Rc<EngineSession>,
    host: HostContext,
}

impl ScriptRunner {
    /// Installs the host API into `session` and prepares to run.
    ///
    /// # Errors
    ///
    /// Returns error if the host API cannot be installed.
    pub fn new(session: Rc<EngineSession>, host: HostContext) -> Result<Self, EngineError> {
        host::install(session.lua(), &host)?;
        Ok(Self { session, host })
    }

    /// Loads the main script, runs it and drives the event loop.
    ///
    /// # Errors
    ///
    /// Only failures outside the script are errors: an unreadable script
    /// file or an engine that cannot run the compiler. Script errors are
    /// reported through [`ScriptStatus`] and the return code.
    pub async fn run(&self) -> Result<ScriptStatus, EngineError> {
        let path = &self.host.script;
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::ScriptRead {
            path: path.clone(),
            source,
        })?;

        let kind = ScriptKind::from_path(path);
        tracing::debug!(script = %path.display(), ?kind, "loading script");
        let code = match kind {
            ScriptKind::Lua => source,
            ScriptKind::Brew => match self.session.convert(&source)? {
                Conversion::Compiled(code) => code,
                Conversion::Failed(message) => {
                    let message = format!("{}: {message}", path.display());
                    self.report(&message);
                    return Ok(ScriptStatus::ConversionFailed(message));
                }
            },
        };

        let chunk_name = format!("@{}", path.display());
        let main = self.session.lua().load(code.as_str()).set_name(chunk_name).exec();
        if let Err(err) = main {
            return Ok(self.settle(&err));
        }

        let event_loop = EventLoop::new(self.host.timers.clone(), self.host.return_code.clone());
        match event_loop.run().await {
            Ok(ran) => {
                tracing::debug!(callbacks = ran, "script finished");
                if self.host.return_code.exit_requested() {
                    Ok(ScriptStatus::Exited)
                } else {
                    Ok(ScriptStatus::Completed)
                }
            }
            Err(err) => Ok(self.settle(&err)),
        }
    }

    /// Classifies an error that escaped the script.
    fn settle(&self, err: &mlua::Error) -> ScriptStatus {
        if self.host.return_code.exit_requested() {
            self.host.timers.borrow_mut().clear();
            return ScriptStatus::Exited;
        }
        let message = describe(err);
        self.report(&message);
        ScriptStatus::Failed(message)
    }

    fn report(&self, message: &str) {
        tracing::debug!(error = %message, "script failed");
        self.host.return_code.set_if_unset(FAILURE_EXIT_CODE);
        if let Err(e) = self.host.streams.stderr().write_line(&format!("Error: {message}")) {
            tracing::warn!(error = %e, "failed to write script error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(ScriptKind::from_path(Path::new("a.brew")), ScriptKind::Brew);
        assert_eq!(ScriptKind::from_path(Path::new("a.BREW")), ScriptKind::Brew);
        assert_eq!(ScriptKind::from_path(Path::new("a.lua")), ScriptKind::Lua);
        assert_eq!(ScriptKind::from_path(Path::new("script")), ScriptKind::Lua);
    }
}
