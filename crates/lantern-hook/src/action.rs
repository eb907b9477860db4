//! Action trait and testing utilities.

use crate::HookError;

/// A single registered action.
///
/// Actions take no arguments and produce no value. A failing action returns
/// an error which the registry hands back to whoever fired the hook.
///
/// Actions are not required to be `Send`: the registry lives on the
/// controller's thread and is fired synchronously.
pub trait Action {
    /// Identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Runs the action.
    fn call(&self) -> Result<(), HookError>;
}

/// [`Action`] backed by a closure.
pub struct FnAction<F> {
    id: String,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn() -> Result<(), HookError>,
{
    /// Wraps `f` as an action named `id`.
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn() -> Result<(), HookError>,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn call(&self) -> Result<(), HookError> {
        (self.f)()
    }
}

/// Test utilities for the hook system.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared log that records action IDs in invocation order.
    pub type CallLog = Rc<RefCell<Vec<String>>>;

    /// A mock action that appends a label to a shared log.
    pub struct MockAction {
        /// Action ID.
        pub id: String,
        /// Label pushed on every call.
        pub label: String,
        /// Shared log.
        pub log: CallLog,
        /// When set, the call fails with this message after logging.
        pub fail_with: Option<String>,
    }

    impl MockAction {
        /// Creates a mock that logs `label` on each call.
        pub fn recording(id: &str, label: &str, log: &CallLog) -> Self {
            Self {
                id: id.to_string(),
                label: label.to_string(),
                log: Rc::clone(log),
                fail_with: None,
            }
        }

        /// Creates a mock that logs `label` and then fails.
        pub fn failing(id: &str, label: &str, log: &CallLog, message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::recording(id, label, log)
            }
        }
    }

    impl Action for MockAction {
        fn id(&self) -> &str {
            &self.id
        }

        fn call(&self) -> Result<(), HookError> {
            self.log.borrow_mut().push(self.label.clone());
            match &self.fail_with {
                Some(message) => Err(HookError::action_failed("", &self.id, message.clone())),
                None => Ok(()),
            }
        }
    }

    /// Creates an empty call log.
    #[must_use]
    pub fn call_log() -> CallLog {
        Rc::new(RefCell::new(Vec::new()))
    }
}
