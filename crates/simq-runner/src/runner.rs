//! Drives a scenario through an [`EventQueue`].

use crate::scenario::{EventSpec, Placement, Scenario};
use serde::{Deserialize, Serialize};
use simq_core::tracer::{MemorySink, QueueTracer, QueueTracerConfig};
use simq_core::{ActionError, Event, EventQueue, RunStats, ScheduleError, SimTime};
use std::cell::RefCell;
use std::rc::Rc;

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Override the scenario's end boundary.
    pub end_time: Option<SimTime>,
    /// Override the scenario's tracer spec.
    pub trace: Option<String>,
    /// Stop after the last event at or before this time.
    pub until: Option<SimTime>,
    /// Collect diagnostic lines into the report instead of logging them.
    pub capture_diagnostics: bool,
}

/// One action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    /// Event label.
    pub label: String,
    /// Firing time.
    pub at: SimTime,
}

/// Outcome of running a scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Initial events accepted by the queue.
    pub scheduled: u64,
    /// Initial events refused by the queue.
    pub rejected: u64,
    /// Run loop counters.
    pub stats: RunStats,
    /// Events still queued when the run stopped.
    pub remaining: u64,
    /// Every action invocation, in firing order.
    pub timeline: Vec<Firing>,
    /// Captured diagnostic lines, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

type Timeline = Rc<RefCell<Vec<Firing>>>;

/// Run a scenario to completion (or to `options.until`).
pub fn run_scenario(scenario: &Scenario, options: &RunOptions) -> RunReport {
    let mut config = scenario.queue.clone();
    if let Some(end_time) = options.end_time {
        config.end_time = Some(end_time);
    }
    if let Some(ref trace) = options.trace {
        config.trace = trace.clone();
    }

    let mut queue = EventQueue::from_config(&config);
    let sink = MemorySink::new();
    if options.capture_diagnostics {
        queue.set_tracer(QueueTracer::with_sink(
            QueueTracerConfig::from_spec(&config.trace),
            sink.clone(),
        ));
    }

    let timeline: Timeline = Rc::new(RefCell::new(Vec::new()));
    let mut report = RunReport::default();

    for event in &scenario.events {
        let built = build_event(&event.spec, Rc::clone(&timeline));
        match schedule(&mut queue, event.at, event.spec.placement, built) {
            Ok(()) => report.scheduled += 1,
            Err(_) => report.rejected += 1,
        }
    }
    tracing::info!(
        scheduled = report.scheduled,
        rejected = report.rejected,
        "scenario scheduled"
    );

    report.stats = match options.until {
        Some(limit) => queue.run_until(limit),
        None => queue.run(),
    };
    report.remaining = queue.len() as u64;
    report.timeline = timeline.borrow().clone();
    report.diagnostics = sink.lines();

    if report.stats.events_failed > 0 {
        tracing::warn!(failed = report.stats.events_failed, "some actions failed");
    }
    report
}

fn schedule(
    queue: &mut EventQueue,
    at: SimTime,
    placement: Placement,
    event: Event,
) -> Result<(), ScheduleError> {
    match placement {
        Placement::Before => queue.enqueue_before(at, event),
        Placement::After => queue.enqueue_after(at, event),
    }
}

// Follow-ups are scheduled before a scripted failure is reported.
fn build_event(spec: &EventSpec, timeline: Timeline) -> Event {
    let spec = spec.clone();
    Event::new(spec.label.clone(), move |queue, at| {
        timeline.borrow_mut().push(Firing {
            label: spec.label.clone(),
            at,
        });

        for follow_up in &spec.then {
            let child = build_event(&follow_up.spec, Rc::clone(&timeline));
            schedule(
                queue,
                at.saturating_add(follow_up.delay),
                follow_up.spec.placement,
                child,
            )?;
        }

        if spec.fail {
            return Err(ActionError::failed(format!("scripted failure in \"{}\"", spec.label)));
        }
        Ok(())
    })
}
