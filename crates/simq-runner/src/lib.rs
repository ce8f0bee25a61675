//! # simq-runner
//!
//! Loads YAML scenarios, schedules their events on a
//! [`simq_core::EventQueue`], drains the queue, and reports what fired.
//!
//! ```rust
//! use simq_runner::{run_scenario, RunOptions, Scenario};
//!
//! let scenario = Scenario::from_yaml(
//!     "events:\n  - label: ping\n    at: 10\n    then:\n      - label: pong\n        delay: 3\n",
//! )?;
//! let report = run_scenario(&scenario, &RunOptions::default());
//! assert_eq!(report.stats.events_fired, 2);
//! assert_eq!(report.timeline[1].label, "pong");
//! # Ok::<(), simq_runner::RunnerError>(())
//! ```

mod error;
mod runner;
mod scenario;

pub use error::{Result, RunnerError};
pub use runner::{run_scenario, Firing, RunOptions, RunReport};
pub use scenario::{EventSpec, FollowUp, Placement, Scenario, ScheduledEvent};
pub use simq_core::SimTime;
