//! Execution controller.
//!
//! The lifecycle is expressed as consuming types so an out-of-order call
//! does not compile:
//!
//! ```text
//! App (Created) ──configure(resolver)──► ConfiguredApp (Configured)
//!                                              │ run().await
//!                                              ▼
//!                                   RunOutcome (Terminated)
//! ```
//!
//! | Transition | Work |
//! |------------|------|
//! | new | install plugins into the registry |
//! | configure | fire `process-starting`, resolve config, reconfigure output, register config hooks |
//! | run | install host API, fire `main-ready`, run script and event loop |
//! | finish | read the return code (unset → 0) |

mod phase;

pub use phase::Phase;

use crate::hooks::register_config_hooks;
use crate::AppError;
use lantern_hook::{HookPoint, HookRegistry, PluginSet};
use lantern_lua::{
    BootstrapSource, ConversionService, HostContext, ScriptRunner, ScriptStatus, TimerQueue,
};
use lantern_runtime::{ConfigResolver, ExecutionConfig, ExecutionState, OutputStreams};
use std::rc::Rc;

/// A freshly started host: output installed, plugins registered.
pub struct App {
    streams: OutputStreams,
    registry: HookRegistry,
}

impl App {
    /// Creates the controller and installs `plugins`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Hook`] if a plugin fails to register.
    pub fn new(streams: OutputStreams, plugins: &PluginSet) -> Result<Self, AppError> {
        let mut registry = HookRegistry::new();
        plugins.install(&mut registry)?;
        tracing::debug!(
            plugins = plugins.len(),
            actions = registry.len(),
            phase = %Phase::Created,
            "app created"
        );
        Ok(Self { streams, registry })
    }

    /// Registry for embedders that add actions before configuring.
    pub fn registry_mut(&mut self) -> &mut HookRegistry {
        &mut self.registry
    }

    /// Output streams shared with the script.
    #[must_use]
    pub fn streams(&self) -> &OutputStreams {
        &self.streams
    }

    /// Fires `process-starting`, resolves configuration and prepares the run.
    ///
    /// # Errors
    ///
    /// - [`AppError::Hook`] if a `process-starting` action fails
    /// - [`AppError::Config`] if the resolver fails (including help/usage)
    /// - [`AppError::HookDef`] if a config hook is malformed
    pub fn configure(mut self, resolver: impl ConfigResolver) -> Result<ConfiguredApp, AppError> {
        self.registry.fire(HookPoint::ProcessStarting)?;

        let config = resolver.resolve()?;
        let settings = &config.settings;

        let choice = settings.output.choice();
        if choice.fell_back() {
            tracing::warn!(
                requested = %settings.output.encoding,
                using = choice.name(),
                "unknown output encoding, falling back"
            );
        }
        self.streams.reconfigure(choice, settings.output.policy);

        let bootstrap = BootstrapSource::from_override(settings.engine.bootstrap_path.clone());
        let service = Rc::new(ConversionService::new(bootstrap));
        let hooks = register_config_hooks(&mut self.registry, &settings.hooks, &config, &service)?;

        tracing::info!(
            script = %config.script.display(),
            args = config.args.len(),
            hooks,
            phase = %Phase::Configured,
            "configuration resolved"
        );

        Ok(ConfiguredApp {
            streams: self.streams,
            registry: self.registry,
            service,
            state: ExecutionState::new(config),
        })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Configuration parsed; ready to run the script.
pub struct ConfiguredApp {
    streams: OutputStreams,
    registry: HookRegistry,
    service: Rc<ConversionService>,
    state: ExecutionState,
}

impl ConfiguredApp {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &ExecutionConfig {
        self.state.config()
    }

    /// Execution state, including the return-code cell.
    #[must_use]
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// The conversion service backing the engine session.
    #[must_use]
    pub fn service(&self) -> &ConversionService {
        &self.service
    }

    /// Registry, for actions that need configuration to exist.
    pub fn registry_mut(&mut self) -> &mut HookRegistry {
        &mut self.registry
    }

    /// Fires `main-ready`, runs the script and drives the event loop.
    ///
    /// # Errors
    ///
    /// - [`AppError::Engine`] if the session cannot be built or the script
    ///   cannot be read
    /// - [`AppError::Hook`] if a `main-ready` action fails
    ///
    /// Errors raised by the script itself are not `Err`: they are reported on
    /// stderr and reflected in the outcome's exit code.
    pub async fn run(mut self) -> Result<RunOutcome, AppError> {
        let session = self.service.instance()?;
        tracing::debug!(
            compiler = session.compiler_version(),
            bootstrap = ?session.bootstrap(),
            "engine session ready"
        );
        let config = self.state.config();
        let host = HostContext {
            script: config.script.clone(),
            args: config.args.clone(),
            return_code: self.state.return_code().clone(),
            streams: self.streams.clone(),
            timers: TimerQueue::shared(),
        };
        let runner = ScriptRunner::new(session, host)?;

        if let Err(e) = self.registry.fire(HookPoint::MainReady) {
            // lantern.exit from a hook ends the run before the script starts.
            if self.state.return_code().exit_requested() {
                tracing::info!(code = self.state.finalize(), "exit requested by main-ready hook");
                return Ok(self.finish(ScriptStatus::Exited));
            }
            return Err(e.into());
        }

        tracing::info!(phase = %Phase::Running, "running script");
        self.state.mark_ran();
        let status = runner.run().await?;
        Ok(self.finish(status))
    }

    fn finish(self, status: ScriptStatus) -> RunOutcome {
        self.streams.flush_all();
        let exit_code = self.state.finalize();
        tracing::info!(exit_code, ?status, phase = %Phase::Terminated, "run finished");
        RunOutcome {
            exit_code,
            status,
            ran: self.state.ran(),
        }
    }
}

impl std::fmt::Debug for ConfiguredApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredApp")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Process exit status requested by the script (unset → 0).
    pub exit_code: i32,
    /// How the script ended.
    pub status: ScriptStatus,
    /// `false` when a hook ended the run before the script started.
    pub ran: bool,
}
