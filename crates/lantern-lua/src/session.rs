//! Engine session and the conversion service.
//!
//! # Architecture
//!
//! ```text
//! ConversionService ──instance()──► Rc<EngineSession>
//!                                       │
//!                                       ├── mlua::Lua (one per process)
//!                                       ├── global `brew`      (compiler module)
//!                                       └── global `converter` (ConverterBridge userdata)
//!
//! convert(text):
//!   converter.source = text
//!   pcall(brew.compile, converter.source) ──► (ok, payload)
//! ```
//!
//! `EngineSession` owns a non-`Send` `Lua` and is itself `!Send`, so the
//! single-call-at-a-time contract of the shared `source` slot holds by
//! construction.

use crate::bootstrap::BootstrapSource;
use crate::error::{describe, EngineError};
use mlua::{AnyUserData, Lua, UserData, UserDataFields, Value};
use std::cell::OnceCell;
use std::rc::Rc;

/// Chunk that runs the compiler over the bridge's `source` slot.
const INVOKE_CHUNK: &str = "return pcall(function() return brew.compile(converter.source) end)";

/// Host-exposed bridge object, bound as the global `converter`.
#[derive(Debug, Default)]
pub struct ConverterBridge {
    source: String,
}

impl UserData for ConverterBridge {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("source", |_, this| Ok(this.source.clone()));
        fields.add_field_method_set("source", |_, this, value: String| {
            this.source = value;
            Ok(())
        });
    }
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// Compiled Lua source.
    Compiled(String),
    /// Compiler diagnostic.
    Failed(String),
}

impl Conversion {
    /// `true` for [`Conversion::Compiled`].
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled(_))
    }

    /// Compiled text or diagnostic.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Compiled(text) | Self::Failed(text) => text,
        }
    }

    /// `(ok, payload)` pair.
    #[must_use]
    pub fn into_pair(self) -> (bool, String) {
        match self {
            Self::Compiled(text) => (true, text),
            Self::Failed(text) => (false, text),
        }
    }
}

/// The single engine instance with the compiler loaded.
pub struct EngineSession {
    lua: Lua,
    bridge: AnyUserData,
    bootstrap: BootstrapSource,
    compiler_version: String,
}

impl EngineSession {
    /// Creates the engine and evaluates the bootstrap into it.
    ///
    /// # Errors
    ///
    /// Fails when the bootstrap cannot be found, cannot be evaluated, or
    /// does not return a table with a `compile` function.
    pub fn new(bootstrap: BootstrapSource) -> Result<Self, EngineError> {
        let lua = Lua::new();
        let code = bootstrap.load()?;

        let module: Value = lua
            .load(&*code)
            .set_name(bootstrap.chunk_name())
            .eval()
            .map_err(|e| EngineError::BootstrapInvalid(describe(&e)))?;
        let Value::Table(module) = module else {
            return Err(EngineError::BootstrapInvalid(format!(
                "expected a module table, got {}",
                module.type_name()
            )));
        };
        let compile: Value = module.get("compile")?;
        if !matches!(compile, Value::Function(_)) {
            return Err(EngineError::BootstrapInvalid(
                "module has no `compile` function".into(),
            ));
        }
        let compiler_version = module
            .get::<Option<String>>("version")?
            .unwrap_or_else(|| "unknown".to_string());

        let globals = lua.globals();
        globals.set("brew", module)?;
        let bridge = lua.create_userdata(ConverterBridge::default())?;
        globals.set("converter", bridge.clone())?;

        tracing::debug!(
            bootstrap = ?bootstrap,
            version = %compiler_version,
            "engine session created"
        );

        Ok(Self {
            lua,
            bridge,
            bootstrap,
            compiler_version,
        })
    }

    /// Session with the bundled compiler.
    ///
    /// # Errors
    ///
    /// See [`EngineSession::new`].
    pub fn embedded() -> Result<Self, EngineError> {
        Self::new(BootstrapSource::default())
    }

    /// Writes `text` into the bridge's `source` slot.
    ///
    /// # Errors
    ///
    /// Fails if the slot is currently borrowed by the engine.
    pub fn set_source(&self, text: &str) -> Result<(), EngineError> {
        let mut bridge = self.bridge.borrow_mut::<ConverterBridge>()?;
        bridge.source = text.to_string();
        Ok(())
    }

    /// Current contents of the `source` slot.
    ///
    /// # Errors
    ///
    /// Fails if the slot is currently borrowed mutably.
    pub fn source(&self) -> Result<String, EngineError> {
        Ok(self.bridge.borrow::<ConverterBridge>()?.source.clone())
    }

    /// Runs the compiler over the current `source` slot.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when the invocation chunk itself cannot run or
    /// the compiler returns a non-string. A compile error is
    /// `Ok(Conversion::Failed)`.
    pub fn invoke_compiler(&self) -> Result<Conversion, EngineError> {
        let (ok, payload): (bool, Value) = self
            .lua
            .load(INVOKE_CHUNK)
            .set_name("=lantern:invoke")
            .call(())?;

        if ok {
            match payload {
                Value::String(text) => Ok(Conversion::Compiled(text.to_string_lossy())),
                other => Err(EngineError::Protocol(other.type_name().to_string())),
            }
        } else {
            let message = failure_message(&payload);
            tracing::debug!(error = %message, "conversion failed");
            Ok(Conversion::Failed(message))
        }
    }

    /// Converts `text` to Lua source.
    ///
    /// # Errors
    ///
    /// See [`EngineSession::invoke_compiler`].
    pub fn convert(&self, text: &str) -> Result<Conversion, EngineError> {
        self.set_source(text)?;
        self.invoke_compiler()
    }

    /// Executes a Lua chunk in the session.
    ///
    /// # Errors
    ///
    /// Returns the chunk's error.
    pub fn exec(&self, code: &str, chunk_name: &str) -> Result<(), EngineError> {
        self.lua.load(code).set_name(chunk_name).exec()?;
        Ok(())
    }

    /// How many times the bootstrap has been evaluated in this engine.
    #[must_use]
    pub fn bootstrap_loads(&self) -> u32 {
        self.lua
            .globals()
            .get::<Option<u32>>("BREW_LOADS")
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Version string reported by the compiler module.
    #[must_use]
    pub fn compiler_version(&self) -> &str {
        &self.compiler_version
    }

    /// Where the bootstrap came from.
    #[must_use]
    pub fn bootstrap(&self) -> &BootstrapSource {
        &self.bootstrap
    }

    /// The underlying Lua state.
    #[must_use]
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("bootstrap", &self.bootstrap)
            .field("compiler_version", &self.compiler_version)
            .finish_non_exhaustive()
    }
}

fn failure_message(payload: &Value) -> String {
    let message = match payload {
        Value::String(s) => s.to_string_lossy(),
        Value::Error(e) => describe(e),
        Value::Nil => String::new(),
        other => format!("compiler raised a {}", other.type_name()),
    };
    if message.is_empty() {
        "conversion failed".to_string()
    } else {
        message
    }
}

/// Lazily constructed owner of the process's one [`EngineSession`].
///
/// Created by the controller at start-up; every component that needs the
/// engine asks it for [`instance`](Self::instance) and receives the same
/// session.
#[derive(Debug, Default)]
pub struct ConversionService {
    bootstrap: BootstrapSource,
    session: OnceCell<Rc<EngineSession>>,
}

impl ConversionService {
    /// Service that will build its session from `bootstrap`.
    #[must_use]
    pub fn new(bootstrap: BootstrapSource) -> Self {
        Self {
            bootstrap,
            session: OnceCell::new(),
        }
    }

    /// Returns the session, constructing it on first call.
    ///
    /// # Errors
    ///
    /// Session construction errors. A failed construction is not cached,
    /// so a later call retries.
    pub fn instance(&self) -> Result<Rc<EngineSession>, EngineError> {
        if let Some(session) = self.session.get() {
            return Ok(Rc::clone(session));
        }
        let session = Rc::new(EngineSession::new(self.bootstrap.clone())?);
        Ok(Rc::clone(self.session.get_or_init(|| session)))
    }

    /// `true` once the session exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EngineSession {
        EngineSession::embedded().expect("embedded session")
    }

    #[test]
    fn instance_is_singleton() {
        let service = ConversionService::default();
        assert!(!service.is_initialized());
        let a = service.instance().expect("first");
        let b = service.instance().expect("second");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.bootstrap_loads(), 1);
    }

    #[test]
    fn valid_input_compiles() {
        let s = session();
        let result = s.convert("x = 1\nprint x\n").expect("convert");
        let Conversion::Compiled(lua) = result else {
            panic!("expected compiled output, got {result:?}");
        };
        assert!(lua.starts_with("-- brew "));
        assert!(lua.contains("local x"));
        assert!(lua.contains("x = 1"));
        assert!(lua.contains("print(x)"));
    }

    #[test]
    fn empty_input_still_produces_output() {
        let s = session();
        let result = s.convert("").expect("convert");
        assert!(result.is_compiled());
        assert!(!result.payload().is_empty());
    }

    #[test]
    fn invalid_input_reports_failure() {
        let s = session();
        let result = s.convert("if x\nprint 1\n").expect("convert");
        let (ok, msg) = result.into_pair();
        assert!(!ok);
        assert!(msg.contains("line 2"), "message: {msg}");
    }

    #[test]
    fn conversion_is_deterministic() {
        let s = session();
        let src = "add = (a, b) ->\n  a + b\nprint add(1, 2)\n";
        let first = s.convert(src).expect("first");
        let second = s.convert(src).expect("second");
        assert!(first.is_compiled());
        assert_eq!(first, second);
    }

    #[test]
    fn bridge_slot_is_visible_to_lua() {
        let s = session();
        s.set_source("hello").expect("set");
        let seen: String = s.lua().load("return converter.source").eval().expect("eval");
        assert_eq!(seen, "hello");

        s.lua()
            .load("converter.source = 'from lua'")
            .exec()
            .expect("exec");
        assert_eq!(s.source().expect("source"), "from lua");
    }

    #[test]
    fn compiled_output_runs() {
        let s = session();
        let lua_src = s
            .convert("add = (a, b) ->\n  a + b\n_G.RESULT = add 2, 3\n")
            .expect("convert");
        let Conversion::Compiled(code) = lua_src else {
            panic!("expected compiled output");
        };
        s.exec(&code, "=test").expect("exec");
        let result: i64 = s.lua().globals().get("RESULT").expect("RESULT");
        assert_eq!(result, 5);
    }

    #[test]
    fn bootstrap_without_compile_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.lua");
        std::fs::write(&path, "return { version = '0' }").expect("write");
        let err = EngineSession::new(BootstrapSource::File(path)).unwrap_err();
        assert!(matches!(err, EngineError::BootstrapInvalid(_)), "got {err:?}");
    }

    #[test]
    fn missing_bootstrap_is_fatal() {
        let service = ConversionService::new(BootstrapSource::Embedded("missing".into()));
        let err = service.instance().unwrap_err();
        assert!(matches!(err, EngineError::BootstrapMissing(_)));
        assert!(!service.is_initialized());
    }

    #[test]
    fn non_string_result_is_protocol_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("numbers.lua");
        std::fs::write(&path, "return { compile = function(src) return 42 end }").expect("write");
        let s = EngineSession::new(BootstrapSource::File(path)).expect("session");
        let err = s.convert("anything").unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }
}
