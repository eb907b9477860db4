//! Hook registry — ordered dispatch of actions by hook name.
//!
//! Not thread-safe: the registry is owned by the controller and fired on its
//! thread. Registration between firings is allowed; registration during a
//! firing is not (firing borrows the registry shared).

use crate::{Action, HookError};
use std::collections::HashMap;

/// A registered action with metadata.
struct RegisteredAction {
    action: Box<dyn Action>,
    /// Registration sequence number, unique across the registry.
    seq: u64,
}

/// Mapping from hook name to an ordered list of actions.
///
/// Insertion order is preserved per name. Registering the same action twice
/// fires it twice.
pub struct HookRegistry {
    hooks: HashMap<String, Vec<RegisteredAction>>,
    next_seq: u64,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Appends `action` to the list for `hook`, creating the list if absent.
    ///
    /// Returns the action's ID.
    pub fn register(&mut self, hook: impl AsRef<str>, action: Box<dyn Action>) -> String {
        let id = action.id().to_string();
        let seq = self.next_seq;
        self.next_seq += 1;

        tracing::debug!(hook = hook.as_ref(), action_id = %id, seq, "registering hook action");
        self.hooks
            .entry(hook.as_ref().to_string())
            .or_default()
            .push(RegisteredAction { action, seq });
        id
    }

    /// Removes every action with the given ID. Returns the number removed.
    pub fn unregister(&mut self, action_id: &str) -> usize {
        let mut removed = 0;
        for actions in self.hooks.values_mut() {
            let before = actions.len();
            actions.retain(|ra| ra.action.id() != action_id);
            removed += before - actions.len();
        }
        removed
    }

    /// Number of actions registered for `hook`.
    #[must_use]
    pub fn count(&self, hook: impl AsRef<str>) -> usize {
        self.hooks.get(hook.as_ref()).map_or(0, Vec::len)
    }

    /// Returns the total number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Returns `true` if no actions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every action registered for `hook`, in registration order.
    ///
    /// A hook with no registrations is a no-op. The first failing action
    /// stops the firing; actions before it have already run. Returns the
    /// number of actions invoked.
    pub fn fire(&self, hook: impl AsRef<str>) -> Result<usize, HookError> {
        let hook = hook.as_ref();
        let Some(actions) = self.hooks.get(hook) else {
            tracing::trace!(hook, "no actions registered");
            return Ok(0);
        };

        tracing::debug!(hook, count = actions.len(), "firing hook");
        for ra in actions {
            if let Err(e) = ra.action.call() {
                tracing::warn!(
                    hook,
                    action_id = ra.action.id(),
                    seq = ra.seq,
                    error = %e,
                    "hook action failed"
                );
                return Err(match e {
                    HookError::ActionFailed { message, .. } => {
                        HookError::action_failed(hook, ra.action.id(), message)
                    }
                    other => other,
                });
            }
        }
        Ok(actions.len())
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&str, usize)> = self
            .hooks
            .iter()
            .map(|(name, actions)| (name.as_str(), actions.len()))
            .collect();
        names.sort_unstable();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}
