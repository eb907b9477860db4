//! Host API exposed to scripts as the global `lantern` table.
//!
//! | Function | Description |
//! |----------|-------------|
//! | `lantern.args` | Script arguments (sequence of strings) |
//! | `lantern.script` | Script path |
//! | `lantern.version` | Host version |
//! | `lantern.exit(code?)` | Record the exit code (default 0) and stop |
//! | `lantern.compile(src)` | Compile Brew source to Lua, raising on failure |
//! | `lantern.defer(fn)` | Run `fn` on the next loop turn |
//! | `lantern.set_timeout(fn, ms)` | Run `fn` after `ms` milliseconds, returns an id |
//! | `lantern.clear_timeout(id)` | Cancel a pending timer |
//! | `lantern.warn(...)` | Write a warning line to stderr |
//!
//! `print` is replaced so output passes through the encoding shim.
//! `pcall`, `xpcall` and `coroutine.resume` are wrapped so a script cannot
//! catch its own `lantern.exit`.

use crate::error::EngineError;
use crate::event_loop::SharedTimers;
use lantern_runtime::{OutputStreams, ReturnCode};
use mlua::{Function, Lua, MultiValue, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Host version reported as `lantern.version`.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-raises a caught error once exit was requested, so protected calls
/// keep unwinding up to the host.
const EXIT_GUARD: &str = r#"
local exiting = ...
local pcall, xpcall, resume, error = pcall, xpcall, coroutine.resume, error
local function settle(ok, ...)
  if not ok and exiting() then error((...), 0) end
  return ok, ...
end
_G.pcall = function(f, ...) return settle(pcall(f, ...)) end
_G.xpcall = function(f, handler, ...) return settle(xpcall(f, handler, ...)) end
coroutine.resume = function(co, ...) return settle(resume(co, ...)) end
"#;

/// Raised through the engine to unwind the running chunk after
/// `lantern.exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSignal(pub i32);

impl std::fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "script exited with code {}", self.0)
    }
}

impl std::error::Error for ExitSignal {}

/// Everything the host API needs from the controller.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub script: PathBuf,
    pub args: Vec<String>,
    pub return_code: ReturnCode,
    pub streams: OutputStreams,
    pub timers: SharedTimers,
}

/// Installs the `lantern` table and rebinds `print`.
///
/// # Errors
///
/// Returns error if any Lua value cannot be created.
pub fn install(lua: &Lua, ctx: &HostContext) -> Result<(), EngineError> {
    let globals = lua.globals();
    let lantern = lua.create_table()?;

    lantern.set("args", lua.create_sequence_from(ctx.args.iter().cloned())?)?;
    lantern.set("script", ctx.script.display().to_string())?;
    lantern.set("version", HOST_VERSION)?;

    let rc = ctx.return_code.clone();
    let exit_fn = lua.create_function(move |_, code: Option<i64>| -> mlua::Result<()> {
        let code = code.unwrap_or(0);
        if code < 0 {
            return Err(mlua::Error::RuntimeError(format!(
                "exit code must be non-negative, got {code}"
            )));
        }
        let code = i32::try_from(code).unwrap_or(i32::MAX);
        tracing::debug!(code, "script requested exit");
        rc.request_exit(code);
        Err(mlua::Error::external(ExitSignal(code)))
    })?;
    lantern.set("exit", exit_fn)?;

    // Raised compile errors reach the script as plain message strings.
    let compile_fn: Function = lua
        .load("return function(src) return brew.compile(src) end")
        .set_name("=lantern.compile")
        .eval()?;
    lantern.set("compile", compile_fn)?;

    let timers = ctx.timers.clone();
    let defer_fn = lua.create_function(move |_, callback: Function| {
        timers
            .borrow_mut()
            .schedule(callback, Duration::ZERO)
            .ok_or_else(|| mlua::Error::RuntimeError("cannot schedule callback".into()))
    })?;
    lantern.set("defer", defer_fn)?;

    let timers = ctx.timers.clone();
    let set_timeout_fn = lua.create_function(move |_, (callback, ms): (Function, Option<f64>)| {
        let ms = ms.unwrap_or(0.0);
        timeout_delay(ms)
            .and_then(|delay| timers.borrow_mut().schedule(callback, delay))
            .ok_or_else(|| mlua::Error::RuntimeError(format!("invalid timeout: {ms} ms")))
    })?;
    lantern.set("set_timeout", set_timeout_fn)?;

    let timers = ctx.timers.clone();
    let clear_timeout_fn =
        lua.create_function(move |_, id: u64| Ok(timers.borrow_mut().cancel(id)))?;
    lantern.set("clear_timeout", clear_timeout_fn)?;

    let tostring: Function = globals.get("tostring")?;

    let stderr = ctx.streams.stderr().clone();
    let to_str = tostring.clone();
    let warn_fn = lua.create_function(move |_, args: MultiValue| {
        let line = join_display(&to_str, args)?;
        tracing::debug!(message = %line, "script warning");
        stderr
            .write_line(&format!("warning: {line}"))
            .map_err(mlua::Error::external)
    })?;
    lantern.set("warn", warn_fn)?;

    let stdout = ctx.streams.stdout().clone();
    let print_fn = lua.create_function(move |_, args: MultiValue| {
        let line = join_display(&tostring, args)?;
        stdout.write_line(&line).map_err(mlua::Error::external)
    })?;
    globals.set("print", print_fn)?;

    globals.set("lantern", lantern)?;

    let rc = ctx.return_code.clone();
    let exiting = lua.create_function(move |_, ()| Ok(rc.exit_requested()))?;
    lua.load(EXIT_GUARD).set_name("=lantern.exit-guard").call::<()>(exiting)?;

    tracing::debug!(script = %ctx.script.display(), args = ctx.args.len(), "host api installed");
    Ok(())
}

/// Delay for `ms` milliseconds. `NaN` and non-positive values mean "now";
/// `None` when the delay does not fit a [`Duration`].
fn timeout_delay(ms: f64) -> Option<Duration> {
    if ms.is_nan() || ms <= 0.0 {
        return Some(Duration::ZERO);
    }
    Duration::try_from_secs_f64(ms / 1000.0).ok()
}

/// Formats values the way Lua's `print` does: `tostring` each, tab separated.
fn join_display(tostring: &Function, args: MultiValue) -> mlua::Result<String> {
    let parts = args
        .into_iter()
        .map(|v: Value| tostring.call::<String>(v))
        .collect::<mlua::Result<Vec<_>>>()?;
    Ok(parts.join("\t"))
}
