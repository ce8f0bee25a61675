//! # simq-core
//!
//! A discrete-event scheduling queue driven by a simulated clock.
//!
//! Events are grouped into buckets by the instant they fire at. Within a
//! bucket, [`EventQueue::enqueue_after`] appends (FIFO) and
//! [`EventQueue::enqueue_before`] prepends, so "before" events always fire
//! ahead of "after" events scheduled at the same instant.
//!
//! The clock starts at [`SimTime::ZERO`] and only advances when events are
//! taken out of the queue. Scheduling in the past, beyond the end boundary,
//! or after [`EventQueue::end_universe`] is refused, reported through the
//! queue's tracer, and leaves the queue untouched.
//!
//! ## Example
//!
//! ```rust
//! use simq_core::{Event, EventQueue, SimTime};
//!
//! let mut queue = EventQueue::new();
//! queue.enqueue_after(SimTime::from_units(10), Event::noop("A"))?;
//! queue.enqueue_after(SimTime::from_units(10), Event::noop("B"))?;
//! queue.enqueue_before(SimTime::from_units(10), Event::noop("C"))?;
//!
//! let (at, batch) = queue.next_batch(false).expect("batch at t=10");
//! let order: Vec<&str> = batch.iter().map(Event::label).collect();
//! assert_eq!(at, SimTime::from_units(10));
//! assert_eq!(order, ["C", "A", "B"]);
//! # Ok::<(), simq_core::ScheduleError>(())
//! ```
//!
//! Actions receive the queue they were taken from and may schedule
//! follow-ups:
//!
//! ```rust
//! use simq_core::{Event, EventQueue, SimTime};
//!
//! let mut queue = EventQueue::new();
//! queue.enqueue_after(
//!     SimTime::from_units(1),
//!     Event::new("tick", |queue, at| {
//!         queue.enqueue_after(at.saturating_add(1), Event::noop("tock"))?;
//!         Ok(())
//!     }),
//! )?;
//!
//! let stats = queue.run();
//! assert_eq!(stats.events_fired, 2);
//! assert_eq!(stats.final_time, SimTime::from_units(2));
//! # Ok::<(), simq_core::ScheduleError>(())
//! ```

mod config;
mod error;
mod event;
mod queue;
mod time;
pub mod tracer;

pub use config::QueueConfig;
pub use error::{ActionError, ActionResult, Result, ScheduleError};
pub use event::{Action, Event};
pub use queue::{EventQueue, RunStats};
pub use time::SimTime;
