//! Events and their actions.

use crate::{ActionResult, EventQueue, SimTime};
use std::fmt;

/// The work an event performs when it fires.
///
/// The action is handed the queue it was taken from, so it can schedule
/// follow-up events at or after the firing instant.
pub type Action = Box<dyn FnOnce(&mut EventQueue, SimTime) -> ActionResult>;

/// A labelled unit of work scheduled on an [`EventQueue`].
pub struct Event {
    label: String,
    action: Action,
}

impl Event {
    /// Create an event from a label and an action.
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&mut EventQueue, SimTime) -> ActionResult + 'static,
    {
        Event {
            label: label.into(),
            action: Box::new(action),
        }
    }

    /// An event whose action does nothing.
    pub fn noop(label: impl Into<String>) -> Self {
        Event::new(label, |_, _| Ok(()))
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Consume the event and run its action at `at`.
    pub fn fire(self, queue: &mut EventQueue, at: SimTime) -> ActionResult {
        (self.action)(queue, at)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("label", &self.label).finish_non_exhaustive()
    }
}
