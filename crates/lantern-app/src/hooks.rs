//! Declarative hooks from the config file.
//!
//! Each enabled `[[hooks]]` entry becomes a [`LuaHookAction`] that runs its
//! Lua inside the shared engine session when its point fires.

use crate::AppError;
use lantern_hook::{Action, HookError, HookHandler, HookPoint, HookRegistry, HooksConfig};
use lantern_lua::{ConversionService, EngineError};
use lantern_runtime::ExecutionConfig;
use std::path::PathBuf;
use std::rc::Rc;

/// Where a config hook's Lua comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookSource {
    /// Inline chunk from the `lua` key.
    Inline(String),
    /// File from the `script` key, resolved against the config base dir.
    File(PathBuf),
}

impl HookSource {
    fn resolve(handler: HookHandler, config: &ExecutionConfig) -> Self {
        match handler {
            HookHandler::Inline(src) => Self::Inline(src),
            HookHandler::Script(path) => Self::File(config.resolve_path(path)),
        }
    }
}

/// Runs a config hook's Lua in the engine session.
///
/// The session is obtained when the action fires, so a hook may be the
/// first thing to construct it.
pub struct LuaHookAction {
    id: String,
    point: HookPoint,
    source: HookSource,
    service: Rc<ConversionService>,
}

impl LuaHookAction {
    /// Creates an action for `point` running `source`.
    pub fn new(
        id: impl Into<String>,
        point: HookPoint,
        source: HookSource,
        service: Rc<ConversionService>,
    ) -> Self {
        Self {
            id: id.into(),
            point,
            source,
            service,
        }
    }

    /// Lua source this action runs.
    #[must_use]
    pub fn source(&self) -> &HookSource {
        &self.source
    }

    fn execute(&self) -> Result<(), EngineError> {
        let session = self.service.instance()?;
        match &self.source {
            HookSource::Inline(code) => session.exec(code, &format!("=hook:{}", self.id)),
            HookSource::File(path) => {
                let code =
                    std::fs::read_to_string(path).map_err(|source| EngineError::ScriptRead {
                        path: path.clone(),
                        source,
                    })?;
                session.exec(&code, &format!("@{}", path.display()))
            }
        }
    }
}

impl Action for LuaHookAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn call(&self) -> Result<(), HookError> {
        tracing::debug!(hook = %self.point, action_id = %self.id, "running config hook");
        self.execute()
            .map_err(|e| HookError::action_failed(self.point.as_str(), &self.id, e.to_string()))
    }
}

impl std::fmt::Debug for LuaHookAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaHookAction")
            .field("id", &self.id)
            .field("point", &self.point)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Validates and registers every enabled hook in `hooks`.
///
/// Anonymous hooks get the id `config#<index>`. Returns the number of
/// registered actions.
///
/// # Errors
///
/// The first invalid definition aborts registration; hooks before it stay
/// registered.
pub fn register_config_hooks(
    registry: &mut HookRegistry,
    hooks: &HooksConfig,
    config: &ExecutionConfig,
    service: &Rc<ConversionService>,
) -> Result<usize, AppError> {
    let mut count = 0;
    for (index, def) in hooks.enabled() {
        let (point, handler) = def.validate()?;
        let id = def
            .id
            .clone()
            .unwrap_or_else(|| format!("config#{index}"));
        let source = HookSource::resolve(handler, config);
        tracing::debug!(hook = %point, action_id = %id, ?source, "registering config hook");
        registry.register(
            point,
            Box::new(LuaHookAction::new(id, point, source, Rc::clone(service))),
        );
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_hook::HookDef;

    fn def(id: Option<&str>, point: &str, lua: Option<&str>, script: Option<&str>) -> HookDef {
        HookDef {
            id: id.map(String::from),
            point: point.into(),
            script: script.map(String::from),
            lua: lua.map(String::from),
            enabled: true,
        }
    }

    fn hooks(defs: Vec<HookDef>) -> HooksConfig {
        HooksConfig { hooks: defs }
    }

    #[test]
    fn inline_hook_runs_in_session() {
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        let config = ExecutionConfig::new("main.lua");
        let n = register_config_hooks(
            &mut registry,
            &hooks(vec![def(Some("seed"), "main-ready", Some("SEED = 41 + 1"), None)]),
            &config,
            &service,
        )
        .expect("register");
        assert_eq!(n, 1);
        assert!(!service.is_initialized());

        registry.fire(HookPoint::MainReady).expect("fire");
        let session = service.instance().expect("session");
        let seed: i64 = session.lua().globals().get("SEED").expect("SEED");
        assert_eq!(seed, 42);
    }

    #[test]
    fn script_hook_resolves_against_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("hook.lua"), "FROM_FILE = 'yes'").expect("write");
        let config = ExecutionConfig::new("main.lua").with_base_dir(dir.path());
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        register_config_hooks(
            &mut registry,
            &hooks(vec![def(None, "main-ready", None, Some("hook.lua"))]),
            &config,
            &service,
        )
        .expect("register");

        registry.fire("main-ready").expect("fire");
        let session = service.instance().expect("session");
        let value: String = session.lua().globals().get("FROM_FILE").expect("FROM_FILE");
        assert_eq!(value, "yes");
    }

    #[test]
    fn anonymous_hooks_get_positional_ids() {
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        let config = ExecutionConfig::new("main.lua");
        register_config_hooks(
            &mut registry,
            &hooks(vec![def(None, "main-ready", Some("error('bad')"), None)]),
            &config,
            &service,
        )
        .expect("register");

        let err = registry.fire("main-ready").unwrap_err();
        match err {
            HookError::ActionFailed {
                hook,
                action_id,
                message,
            } => {
                assert_eq!(hook, "main-ready");
                assert_eq!(action_id, "config#0");
                assert!(message.contains("bad"), "message: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_hook_file_fails_on_fire() {
        let config = ExecutionConfig::new("main.lua").with_base_dir("/nonexistent-lantern-dir");
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        register_config_hooks(
            &mut registry,
            &hooks(vec![def(Some("gone"), "main-ready", None, Some("gone.lua"))]),
            &config,
            &service,
        )
        .expect("register");
        let err = registry.fire("main-ready").unwrap_err();
        assert!(err.to_string().contains("gone.lua"));
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        let config = ExecutionConfig::new("main.lua");
        let err = register_config_hooks(
            &mut registry,
            &hooks(vec![def(Some("early"), "process-starting", Some("x = 1"), None)]),
            &config,
            &service,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::HookDef(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn disabled_hooks_are_skipped() {
        let service = Rc::new(ConversionService::default());
        let mut registry = HookRegistry::new();
        let mut disabled = def(Some("off"), "main-ready", Some("x = 1"), None);
        disabled.enabled = false;
        let n = register_config_hooks(
            &mut registry,
            &hooks(vec![disabled]),
            &ExecutionConfig::new("main.lua"),
            &service,
        )
        .expect("register");
        assert_eq!(n, 0);
        assert_eq!(registry.count("main-ready"), 0);
    }
}
