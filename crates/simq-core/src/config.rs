//! Queue configuration.

use crate::SimTime;
use serde::{Deserialize, Serialize};

/// Configuration for constructing an [`EventQueue`](crate::EventQueue).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Name used as the `queue` metric label.
    pub name: Option<String>,

    /// Latest instant events may be scheduled at.
    /// `None` leaves the boundary at [`SimTime::MAX`].
    pub end_time: Option<SimTime>,

    /// Tracer spec, see [`QueueTracerConfig::from_spec`](crate::tracer::QueueTracerConfig::from_spec).
    pub trace: String,
}

impl QueueConfig {
    /// Set the queue name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the end boundary.
    pub fn with_end_time(mut self, end_time: SimTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Set the tracer spec.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// The effective end boundary.
    pub fn end_time_or_max(&self) -> SimTime {
        self.end_time.unwrap_or(SimTime::MAX)
    }
}
