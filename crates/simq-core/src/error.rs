//! Error types for the event queue.

use crate::SimTime;
use thiserror::Error;

/// Reasons an enqueue attempt is refused.
///
/// A rejected enqueue never mutates the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The requested instant is earlier than the queue clock.
    #[error("cannot schedule at {requested}: clock is already at {now}")]
    BeforeNow {
        /// Requested firing time.
        requested: SimTime,
        /// Queue clock at the time of the attempt.
        now: SimTime,
    },

    /// The requested instant is later than the end boundary.
    #[error("cannot schedule at {requested}: end of time is {end_time}")]
    AfterEnd {
        /// Requested firing time.
        requested: SimTime,
        /// Configured end boundary.
        end_time: SimTime,
    },

    /// The queue has reached the end of the universe.
    #[error("cannot schedule at {requested}: queue has ended")]
    Ended {
        /// Requested firing time.
        requested: SimTime,
    },
}

impl ScheduleError {
    /// The instant the caller asked for.
    pub fn requested(&self) -> SimTime {
        match *self {
            ScheduleError::BeforeNow { requested, .. }
            | ScheduleError::AfterEnd { requested, .. }
            | ScheduleError::Ended { requested } => requested,
        }
    }

    /// Short machine-readable reason, used as a metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            ScheduleError::BeforeNow { .. } => "before_now",
            ScheduleError::AfterEnd { .. } => "after_end",
            ScheduleError::Ended { .. } => "ended",
        }
    }
}

/// Errors returned by an event's action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A follow-up event could not be scheduled.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// The action failed for its own reasons.
    #[error("action failed: {0}")]
    Failed(String),
}

impl ActionError {
    /// Create a generic action failure.
    pub fn failed(message: impl Into<String>) -> Self {
        ActionError::Failed(message.into())
    }
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Result type for event actions.
pub type ActionResult = std::result::Result<(), ActionError>;
