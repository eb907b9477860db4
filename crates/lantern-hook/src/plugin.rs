//! Plugins — explicit registration of hook actions.
//!
//! A plugin contributes actions to the registry when the controller installs
//! it. Installation happens once, in a defined order, before any hook fires.

use crate::{FnAction, HookError, HookPoint, HookRegistry};

/// A bundle of hook actions.
pub trait Plugin {
    /// Plugin name used in logs and errors.
    fn name(&self) -> &str;

    /// Registers this plugin's actions.
    fn register(&self, registry: &mut HookRegistry) -> Result<(), HookError>;
}

/// Ordered collection of plugins.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin; installation follows insertion order.
    #[must_use]
    pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Number of plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registers every plugin's actions into `registry`, in order.
    ///
    /// Stops at the first plugin that fails.
    pub fn install(&self, registry: &mut HookRegistry) -> Result<(), HookError> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "installing plugin");
            plugin
                .register(registry)
                .map_err(|e| HookError::PluginFailed {
                    plugin: plugin.name().to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Logs every lifecycle point as it is reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracePlugin;

impl Plugin for TracePlugin {
    fn name(&self) -> &str {
        "trace"
    }

    fn register(&self, registry: &mut HookRegistry) -> Result<(), HookError> {
        for &point in HookPoint::ALL {
            registry.register(
                point,
                Box::new(FnAction::new(format!("trace:{point}"), move || {
                    tracing::info!(point = %point, "lifecycle point reached");
                    Ok(())
                })),
            );
        }
        Ok(())
    }
}
