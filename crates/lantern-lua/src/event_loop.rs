//! Cooperative event loop for script callbacks.
//!
//! Timers are ordered by due time, then by registration order. The loop
//! runs until no timers remain or the script requested exit.

use lantern_runtime::ReturnCode;
use mlua::Function;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tokio::time::Instant;

/// Timer queue shared between the host API and the loop.
pub type SharedTimers = Rc<RefCell<TimerQueue>>;

/// Pending callbacks keyed by `(due, id)`.
#[derive(Default)]
pub struct TimerQueue {
    pending: BTreeMap<(Instant, u64), Function>,
    due_by_id: HashMap<u64, Instant>,
    next_id: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New empty queue behind `Rc<RefCell>`.
    #[must_use]
    pub fn shared() -> SharedTimers {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Schedules `callback` after `delay`. Returns the timer id, or `None`
    /// when the deadline is past what [`Instant`] can represent.
    pub fn schedule(&mut self, callback: Function, delay: Duration) -> Option<u64> {
        let due = Instant::now().checked_add(delay)?;
        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert((due, id), callback);
        self.due_by_id.insert(id, due);
        Some(id)
    }

    /// Cancels a pending timer. Returns `false` if it already ran or never existed.
    pub fn cancel(&mut self, id: u64) -> bool {
        match self.due_by_id.remove(&id) {
            Some(due) => self.pending.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Due time of the earliest timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Removes and returns the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(u64, Function)> {
        let (&(due, id), _) = self.pending.first_key_value()?;
        if due > now {
            return None;
        }
        self.due_by_id.remove(&id);
        self.pending.remove(&(due, id)).map(|callback| (id, callback))
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.due_by_id.clear();
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.pending.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Drives the timer queue.
#[derive(Debug, Clone)]
pub struct EventLoop {
    timers: SharedTimers,
    return_code: ReturnCode,
}

impl EventLoop {
    /// Loop over `timers` that stops once `return_code` records an exit request.
    #[must_use]
    pub fn new(timers: SharedTimers, return_code: ReturnCode) -> Self {
        Self {
            timers,
            return_code,
        }
    }

    /// Runs callbacks until idle or exit was requested.
    ///
    /// Returns the number of callbacks run.
    ///
    /// # Errors
    ///
    /// The first callback error stops the loop and is returned.
    pub async fn run(&self) -> Result<usize, mlua::Error> {
        let mut ran = 0;
        loop {
            if self.return_code.exit_requested() {
                tracing::debug!(ran, "event loop stopped by exit request");
                break;
            }
            let next = self.timers.borrow().next_due();
            let Some(due) = next else {
                tracing::debug!(ran, "event loop idle");
                break;
            };
            tokio::time::sleep_until(due).await;

            let popped = self.timers.borrow_mut().pop_due(Instant::now());
            if let Some((id, callback)) = popped {
                tracing::trace!(id, "timer fired");
                ran += 1;
                callback.call::<()>(())?;
            }
        }
        Ok(ran)
    }
}
