//! Scenario files.
//!
//! A scenario is a YAML document holding a queue configuration and the
//! events to schedule before the run starts. Each event may carry
//! follow-ups that its action schedules relative to its own firing time.
//!
//! ```yaml
//! queue:
//!   name: demo
//!   end_time: 100
//!   trace: "reject,failure"
//! events:
//!   - label: ping
//!     at: 10
//!     then:
//!       - label: pong
//!         delay: 3
//!   - label: urgent
//!     at: 10
//!     placement: before
//!   - label: flaky
//!     at: 20
//!     fail: true
//! ```

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use simq_core::{QueueConfig, SimTime};
use std::path::Path;

/// Where an event is inserted within its bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Head of the bucket.
    Before,
    /// Tail of the bucket.
    #[default]
    After,
}

/// Fields shared by top-level events and follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Event label.
    pub label: String,
    /// Bucket placement.
    #[serde(default)]
    pub placement: Placement,
    /// Make the action report a failure after scheduling its follow-ups.
    #[serde(default)]
    pub fail: bool,
    /// Events the action schedules when it fires.
    #[serde(default)]
    pub then: Vec<FollowUp>,
}

/// An event scheduled before the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Absolute firing time.
    pub at: SimTime,
    /// Event definition.
    #[serde(flatten)]
    pub spec: EventSpec,
}

/// An event scheduled by another event's action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    /// Offset from the parent's firing time.
    pub delay: u64,
    /// Event definition.
    #[serde(flatten)]
    pub spec: EventSpec,
}

/// A complete scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Initial events.
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl Scenario {
    /// Parse and validate a scenario from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        let scenario = Scenario::from_yaml(&yaml)?;
        tracing::debug!(path = %path.display(), events = scenario.events.len(), "loaded scenario");
        Ok(scenario)
    }

    /// Check structural constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for event in &self.events {
            validate_spec(&event.spec, &format!("event at {}", event.at))?;
        }
        Ok(())
    }

    /// Total number of event definitions, follow-ups included.
    pub fn event_count(&self) -> usize {
        fn count(spec: &EventSpec) -> usize {
            1 + spec.then.iter().map(|f| count(&f.spec)).sum::<usize>()
        }
        self.events.iter().map(|e| count(&e.spec)).sum()
    }
}

fn validate_spec(spec: &EventSpec, context: &str) -> Result<()> {
    if spec.label.trim().is_empty() {
        return Err(RunnerError::invalid(format!("{} has an empty label", context)));
    }
    for follow_up in &spec.then {
        validate_spec(
            &follow_up.spec,
            &format!("follow-up of \"{}\"", spec.label),
        )?;
    }
    Ok(())
}
