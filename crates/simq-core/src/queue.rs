//! The time-ordered event queue.
//!
//! Events live in buckets keyed by their firing instant. The bucket map is
//! ordered by time, so the next event is always at the front of the first
//! non-empty bucket. Inserting "before" puts an event at the head of its
//! bucket and inserting "after" puts it at the tail.
//!
//! The queue clock (`now`) only moves when events are taken out of the
//! queue, and it never moves backwards. Enqueues earlier than `now`, later
//! than the end boundary, or on an ended queue are refused and reported
//! through the queue's [`QueueTracer`].
//!
//! Taking a single event leaves a drained bucket in place; empty buckets
//! at the head of the map are pruned by the next peek or dequeue.

use crate::tracer::{QueueTracer, QueueTracerConfig, TraceRecord};
use crate::{Event, QueueConfig, Result, ScheduleError, SimTime};
use serde::{Deserialize, Serialize};
use simq_metrics::{metric_defs, metrics, QueueLabels};
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

/// Where an event goes within its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Head,
    Tail,
}

impl Placement {
    fn as_str(self) -> &'static str {
        match self {
            Placement::Head => "before",
            Placement::Tail => "after",
        }
    }
}

/// Counters describing a drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Actions invoked, including failed ones.
    pub events_fired: u64,
    /// Actions that returned an error or panicked.
    pub events_failed: u64,
    /// Queue clock when the run stopped.
    pub final_time: SimTime,
}

/// A discrete-event queue with a simulated clock.
#[derive(Debug)]
pub struct EventQueue {
    buckets: BTreeMap<SimTime, VecDeque<Event>>,
    now: SimTime,
    end_time: SimTime,
    initial_end_time: SimTime,
    pending: usize,
    tracer: QueueTracer,
    labels: QueueLabels,
}

impl EventQueue {
    /// Create an empty queue with the default tracer.
    pub fn new() -> Self {
        EventQueue::with_tracer(QueueTracer::default())
    }

    /// Create an empty queue that reports through `tracer`.
    pub fn with_tracer(tracer: QueueTracer) -> Self {
        EventQueue {
            buckets: BTreeMap::new(),
            now: SimTime::ZERO,
            end_time: SimTime::MAX,
            initial_end_time: SimTime::MAX,
            pending: 0,
            tracer,
            labels: QueueLabels::default(),
        }
    }

    /// Create an empty queue from a configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        let mut queue =
            EventQueue::with_tracer(QueueTracer::new(QueueTracerConfig::from_spec(&config.trace)));
        queue.end_time = config.end_time_or_max();
        queue.initial_end_time = queue.end_time;
        if let Some(ref name) = config.name {
            queue.labels = QueueLabels::new(name.clone());
        }
        queue
    }

    /// Replace the tracer.
    pub fn set_tracer(&mut self, tracer: QueueTracer) {
        self.tracer = tracer;
    }

    /// Set the latest instant later enqueues may target.
    ///
    /// Events already queued past the new boundary stay queued. The
    /// boundary lasts until the next [`clear`](EventQueue::clear).
    pub fn set_end_time(&mut self, end_time: SimTime) {
        self.end_time = end_time;
        self.tracer.log(
            TraceRecord::lifecycle(self.now, "end time set")
                .with_detail("end_time", end_time.to_string()),
        );
    }

    /// Current queue clock.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Configured end boundary.
    pub fn end_time(&self) -> SimTime {
        self.end_time
    }

    /// Whether the clock has reached [`SimTime::MAX`]; no enqueue can succeed.
    pub fn is_ended(&self) -> bool {
        self.now.is_max()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Number of buckets in the map, including drained ones not yet pruned.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Schedule `event` at `at`, ahead of everything already in that bucket.
    pub fn enqueue_before(&mut self, at: SimTime, event: Event) -> Result<()> {
        self.enqueue(at, event, Placement::Head)
    }

    /// Schedule `event` at `at`, behind everything already in that bucket.
    pub fn enqueue_after(&mut self, at: SimTime, event: Event) -> Result<()> {
        self.enqueue(at, event, Placement::Tail)
    }

    fn enqueue(
        &mut self,
        at: SimTime,
        event: Event,
        placement: Placement,
    ) -> Result<()> {
        if let Err(err) = self.check_schedulable(at) {
            self.tracer.log(TraceRecord::reject(self.now, event.label(), &err));
            metrics::counter!(
                metric_defs::EVENTS_REJECTED.name,
                &self.labels.with(&[("reason", err.reason().to_string())])
            )
            .increment(1);
            return Err(err);
        }

        tracing::trace!(label = event.label(), %at, placement = placement.as_str(), "enqueue");
        self.tracer.log(TraceRecord::enqueue(self.now, event.label(), at, placement.as_str()));

        let bucket = self.buckets.entry(at).or_default();
        match placement {
            Placement::Head => bucket.push_front(event),
            Placement::Tail => bucket.push_back(event),
        }
        self.pending += 1;

        let labels = self.labels.to_labels();
        metrics::counter!(metric_defs::EVENTS_ENQUEUED.name, &labels).increment(1);
        metrics::gauge!(metric_defs::EVENTS_PENDING.name, &labels).set(self.pending as f64);
        Ok(())
    }

    fn check_schedulable(&self, at: SimTime) -> Result<()> {
        if self.now.is_max() {
            Err(ScheduleError::Ended { requested: at })
        } else if at < self.now {
            Err(ScheduleError::BeforeNow {
                requested: at,
                now: self.now,
            })
        } else if at > self.end_time {
            Err(ScheduleError::AfterEnd {
                requested: at,
                end_time: self.end_time,
            })
        } else {
            Ok(())
        }
    }

    // Drop drained buckets from the head of the map.
    fn prune_head(&mut self) {
        while let Some(entry) = self.buckets.first_entry() {
            if !entry.get().is_empty() {
                break;
            }
            entry.remove();
        }
    }

    /// Instant of the next pending event.
    ///
    /// Prunes drained buckets at the head of the map.
    pub fn peek_next_time(&mut self) -> Option<SimTime> {
        self.prune_head();
        self.buckets.first_key_value().map(|(at, _)| *at)
    }

    /// The next event and its instant, without removing it.
    ///
    /// Prunes drained buckets at the head of the map; the sequence of
    /// pending events is unchanged.
    pub fn peek_next_event(&mut self) -> Option<(SimTime, &Event)> {
        self.prune_head();
        self.buckets
            .first_key_value()
            .and_then(|(at, bucket)| bucket.front().map(|event| (*at, event)))
    }

    /// Remove the next event and move the clock to its instant.
    ///
    /// The clock is not advanced past the instant, so more events can still
    /// be scheduled there.
    pub fn next_event(&mut self) -> Option<(SimTime, Event)> {
        self.prune_head();
        let mut entry = self.buckets.first_entry()?;
        let at = *entry.key();
        let event = entry.get_mut().pop_front()?;

        self.now = at;
        self.pending -= 1;
        tracing::trace!(label = event.label(), %at, "dequeue");
        self.tracer.log(TraceRecord::dequeue(at, event.label()));
        metrics::gauge!(metric_defs::EVENTS_PENDING.name, &self.labels.to_labels())
            .set(self.pending as f64);
        Some((at, event))
    }

    /// All events at the earliest pending instant, without removing them.
    pub fn peek_next_batch(&mut self) -> Option<(SimTime, &VecDeque<Event>)> {
        self.prune_head();
        self.buckets.first_key_value().map(|(at, bucket)| (*at, bucket))
    }

    /// Remove every event at the earliest pending instant.
    ///
    /// The clock moves to that instant, or one unit past it when
    /// `advance_past` is set, which closes the instant to further enqueues.
    pub fn next_batch(&mut self, advance_past: bool) -> Option<(SimTime, VecDeque<Event>)> {
        self.prune_head();
        let (at, batch) = self.buckets.pop_first()?;

        self.now = if advance_past { at.saturating_next() } else { at };
        self.pending -= batch.len();
        tracing::trace!(%at, size = batch.len(), advance_past, "dequeue batch");
        self.tracer.log(TraceRecord::dequeue_batch(at, batch.len(), advance_past));

        let labels = self.labels.to_labels();
        metrics::histogram!(metric_defs::BATCH_SIZE.name, &labels).record(batch.len() as f64);
        metrics::gauge!(metric_defs::EVENTS_PENDING.name, &labels).set(self.pending as f64);
        Some((at, batch))
    }

    /// Fire events until the queue is empty.
    ///
    /// A failing action is logged and the loop carries on with the next
    /// event. Actions may schedule more events on this queue.
    ///
    /// A panicking action is reported through the tracer like any other
    /// failure, but the process panic hook still runs first. Install a quiet
    /// hook with [`std::panic::set_hook`] to keep its output off stderr.
    pub fn run(&mut self) -> RunStats {
        self.run_while(|_| true)
    }

    /// Fire events scheduled at or before `limit`, leaving later ones queued.
    pub fn run_until(&mut self, limit: SimTime) -> RunStats {
        self.run_while(|at| at <= limit)
    }

    fn run_while(&mut self, mut keep_going: impl FnMut(SimTime) -> bool) -> RunStats {
        let mut stats = RunStats::default();
        loop {
            match self.peek_next_time() {
                Some(at) if keep_going(at) => {}
                _ => break,
            }
            let Some((at, event)) = self.next_event() else {
                break;
            };
            stats.events_fired += 1;
            if !self.fire_isolated(at, event) {
                stats.events_failed += 1;
            }
        }
        stats.final_time = self.now;
        tracing::debug!(
            fired = stats.events_fired,
            failed = stats.events_failed,
            final_time = %stats.final_time,
            "run finished"
        );
        stats
    }

    // Run one action, containing both error returns and panics.
    fn fire_isolated(&mut self, at: SimTime, event: Event) -> bool {
        let label = event.label().to_string();
        self.tracer.log(TraceRecord::fire(at, &label));
        metrics::counter!(metric_defs::EVENTS_FIRED.name, &self.labels.to_labels()).increment(1);

        let failure = match panic::catch_unwind(AssertUnwindSafe(|| event.fire(self, at))) {
            Ok(Ok(())) => return true,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => format!("action panicked: {}", panic_message(payload.as_ref())),
        };

        self.tracer.log(TraceRecord::failure(at, &label, failure));
        metrics::counter!(metric_defs::EVENTS_FAILED.name, &self.labels.to_labels()).increment(1);
        false
    }

    /// Drop every pending event and end the universe.
    ///
    /// The clock is pinned at [`SimTime::MAX`], so every later enqueue is
    /// refused until [`clear`](EventQueue::clear) is called.
    pub fn end_universe(&mut self) {
        self.buckets.clear();
        self.reset_pending();
        self.now = SimTime::MAX;
        self.tracer.log(TraceRecord::lifecycle(self.now, "end of universe"));
    }

    /// Drop every pending event and rewind the clock to [`SimTime::ZERO`].
    ///
    /// The end boundary goes back to the one the queue was constructed
    /// with, discarding any [`set_end_time`](EventQueue::set_end_time).
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.reset_pending();
        self.now = SimTime::ZERO;
        self.end_time = self.initial_end_time;
        self.tracer.log(TraceRecord::lifecycle(self.now, "cleared"));
    }

    fn reset_pending(&mut self) {
        self.pending = 0;
        metrics::gauge!(metric_defs::EVENTS_PENDING.name, &self.labels.to_labels()).set(0.0);
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::{MemorySink, QueueTracerConfig};
    use crate::ActionError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t(units: u64) -> SimTime {
        SimTime::from_units(units)
    }

    fn traced_queue() -> (EventQueue, MemorySink) {
        let sink = MemorySink::new();
        let tracer = QueueTracer::with_sink(QueueTracerConfig::default(), sink.clone());
        (EventQueue::with_tracer(tracer), sink)
    }

    fn labels(batch: &VecDeque<Event>) -> Vec<&str> {
        batch.iter().map(Event::label).collect()
    }

    fn drain_labels(queue: &mut EventQueue) -> Vec<(u64, String)> {
        let mut out = Vec::new();
        while let Some((at, event)) = queue.next_event() {
            out.push((at.as_units(), event.label().to_string()));
        }
        out
    }

    /// Event that appends its label to `log` when fired.
    fn recording(label: &str, log: &Rc<RefCell<Vec<String>>>) -> Event {
        let log = Rc::clone(log);
        let name = label.to_string();
        Event::new(label, move |_, at| {
            log.borrow_mut().push(format!("{}@{}", name, at.as_units()));
            Ok(())
        })
    }

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.now(), SimTime::ZERO);
        assert_eq!(queue.end_time(), SimTime::MAX);
        assert!(queue.is_empty());
        assert!(!queue.is_ended());
        assert!(queue.peek_next_event().is_none());
        assert!(queue.next_event().is_none());
        assert!(queue.next_batch(false).is_none());
    }

    #[test]
    fn test_round_trip_single_event() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(4), Event::noop("E")).unwrap();
        assert_eq!(queue.len(), 1);

        let (at, event) = queue.next_event().unwrap();
        assert_eq!(at, t(4));
        assert_eq!(event.label(), "E");
        assert_eq!(queue.now(), t(4));
        assert!(queue.next_event().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_time_ordering_across_buckets() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(30), Event::noop("late")).unwrap();
        queue.enqueue_after(t(10), Event::noop("early")).unwrap();
        queue.enqueue_before(t(20), Event::noop("middle")).unwrap();

        assert_eq!(
            drain_labels(&mut queue),
            vec![
                (10, "early".to_string()),
                (20, "middle".to_string()),
                (30, "late".to_string()),
            ]
        );
    }

    #[test]
    fn test_enqueue_after_is_fifo() {
        let mut queue = EventQueue::new();
        for label in ["a", "b", "c", "d"] {
            queue.enqueue_after(t(7), Event::noop(label)).unwrap();
        }
        let order: Vec<String> = drain_labels(&mut queue).into_iter().map(|(_, l)| l).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_enqueue_before_is_lifo_and_precedes_after() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(7), Event::noop("after1")).unwrap();
        queue.enqueue_before(t(7), Event::noop("before1")).unwrap();
        queue.enqueue_after(t(7), Event::noop("after2")).unwrap();
        queue.enqueue_before(t(7), Event::noop("before2")).unwrap();

        let order: Vec<String> = drain_labels(&mut queue).into_iter().map(|(_, l)| l).collect();
        assert_eq!(order, vec!["before2", "before1", "after1", "after2"]);
    }

    #[test]
    fn test_batch_order_scenario() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(10), Event::noop("A")).unwrap();
        queue.enqueue_after(t(10), Event::noop("B")).unwrap();
        queue.enqueue_before(t(10), Event::noop("C")).unwrap();

        let (at, batch) = queue.peek_next_batch().unwrap();
        assert_eq!(at, t(10));
        assert_eq!(labels(batch), vec!["C", "A", "B"]);

        let (at, batch) = queue.next_batch(false).unwrap();
        assert_eq!(at, t(10));
        assert_eq!(labels(&batch), vec!["C", "A", "B"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reject_before_now() {
        let (mut queue, sink) = traced_queue();
        queue.enqueue_after(t(5), Event::noop("first")).unwrap();
        queue.enqueue_after(t(9), Event::noop("second")).unwrap();
        queue.next_event().unwrap();

        let err = queue.enqueue_after(t(3), Event::noop("stale")).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::BeforeNow {
                requested: t(3),
                now: t(5),
            }
        );
        assert_eq!(queue.now(), t(5));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_next_time(), Some(t(9)));

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("\"stale\""));
        assert!(errors[0].contains("before_now"));
    }

    #[test]
    fn test_reject_after_end_time() {
        let (mut queue, sink) = traced_queue();
        queue.set_end_time(t(100));

        let err = queue.enqueue_after(t(150), Event::noop("ev")).unwrap_err();
        assert!(matches!(err, ScheduleError::AfterEnd { .. }));
        assert!(queue.is_empty());
        assert_eq!(queue.bucket_count(), 0);
        assert!(queue.peek_next_event().is_none());
        assert_eq!(sink.errors().len(), 1);

        // The boundary itself is inclusive.
        queue.enqueue_before(t(100), Event::noop("edge")).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_instant_enqueue_after_extraction() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(5), Event::noop("ev1")).unwrap();

        let (at, _) = queue.next_event().unwrap();
        assert_eq!(at, t(5));
        assert_eq!(queue.now(), t(5));

        queue.enqueue_before(t(5), Event::noop("ev2")).unwrap();
        let (at, event) = queue.next_event().unwrap();
        assert_eq!(at, t(5));
        assert_eq!(event.label(), "ev2");
    }

    #[test]
    fn test_batch_advance_past_closes_instant() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(5), Event::noop("a")).unwrap();
        queue.enqueue_after(t(8), Event::noop("b")).unwrap();

        let (at, batch) = queue.next_batch(true).unwrap();
        assert_eq!(at, t(5));
        assert_eq!(batch.len(), 1);
        assert_eq!(queue.now(), t(6));
        assert!(queue.enqueue_after(t(5), Event::noop("late")).is_err());
        queue.enqueue_after(t(6), Event::noop("ok")).unwrap();

        let (at, _) = queue.next_batch(false).unwrap();
        assert_eq!(at, t(6));
        assert_eq!(queue.now(), t(6));
        queue.enqueue_after(t(6), Event::noop("still ok")).unwrap();
    }

    #[test]
    fn test_peek_prunes_drained_buckets() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(1), Event::noop("a")).unwrap();
        queue.enqueue_after(t(2), Event::noop("b")).unwrap();

        queue.next_event().unwrap();
        // The drained bucket for t=1 lingers until the next peek.
        assert_eq!(queue.bucket_count(), 2);

        let (at, event) = queue.peek_next_event().unwrap();
        assert_eq!((at, event.label()), (t(2), "b"));
        assert_eq!(queue.bucket_count(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.now(), t(1));
    }

    #[test]
    fn test_clock_never_decreases() {
        let mut queue = EventQueue::new();
        for (units, label) in [(3, "a"), (3, "b"), (9, "c"), (4, "d")] {
            queue.enqueue_after(t(units), Event::noop(label)).unwrap();
        }

        let mut last = queue.now();
        while queue.next_event().is_some() {
            assert!(queue.now() >= last);
            last = queue.now();
            let _ = queue.enqueue_after(t(2), Event::noop("stale"));
            assert!(queue.now() >= last);
        }
        assert_eq!(last, t(9));
    }

    #[test]
    fn test_end_universe_rejects_everything() {
        let (mut queue, sink) = traced_queue();
        queue.enqueue_after(t(5), Event::noop("doomed")).unwrap();
        queue.end_universe();

        assert!(queue.is_ended());
        assert!(queue.is_empty());
        assert!(queue.peek_next_event().is_none());
        assert!(queue.next_event().is_none());
        assert!(queue.peek_next_batch().is_none());

        let err = queue.enqueue_after(SimTime::MAX, Event::noop("x")).unwrap_err();
        assert_eq!(err, ScheduleError::Ended { requested: SimTime::MAX });
        assert!(queue.enqueue_before(t(1), Event::noop("y")).is_err());
        assert_eq!(sink.errors().len(), 2);
    }

    #[test]
    fn test_reaching_max_ends_queue() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(SimTime::MAX, Event::noop("last")).unwrap();
        queue.next_event().unwrap();

        assert!(queue.is_ended());
        assert!(matches!(
            queue.enqueue_after(SimTime::MAX, Event::noop("x")),
            Err(ScheduleError::Ended { .. })
        ));
    }

    #[test]
    fn test_clear_restores_fresh_state() {
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(5), Event::noop("a")).unwrap();
        queue.enqueue_after(t(6), Event::noop("b")).unwrap();
        queue.next_event().unwrap();
        queue.end_universe();

        queue.clear();
        assert_eq!(queue.now(), SimTime::ZERO);
        assert_eq!(queue.end_time(), SimTime::MAX);
        assert!(queue.is_empty());
        assert_eq!(queue.bucket_count(), 0);
        assert!(!queue.is_ended());

        queue.enqueue_after(t(0), Event::noop("again")).unwrap();
        assert_eq!(drain_labels(&mut queue), vec![(0, "again".to_string())]);
    }

    #[test]
    fn test_clear_drops_runtime_end_time() {
        let mut fresh = EventQueue::new();
        let mut cleared = EventQueue::new();
        cleared.set_end_time(t(100));
        assert!(cleared.enqueue_after(t(150), Event::noop("late")).is_err());

        cleared.clear();
        assert_eq!(cleared.end_time(), fresh.end_time());
        assert_eq!(
            cleared.enqueue_after(t(150), Event::noop("late")),
            fresh.enqueue_after(t(150), Event::noop("late"))
        );
        assert_eq!(cleared.len(), 1);
    }

    #[test]
    fn test_clear_keeps_configured_end_time() {
        let config = QueueConfig::default().with_end_time(t(50));
        let mut queue = EventQueue::from_config(&config);
        queue.set_end_time(t(200));
        queue.clear();

        assert_eq!(queue.end_time(), t(50));
        assert!(matches!(
            queue.enqueue_after(t(60), Event::noop("late")),
            Err(ScheduleError::AfterEnd { .. })
        ));
    }

    mod pending_gauge {
        use super::*;
        use simq_metrics::metrics::{
            Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
            Unit,
        };
        use std::sync::{Arc, Mutex};

        #[derive(Default)]
        struct LastValue(Mutex<Option<f64>>);

        impl GaugeFn for LastValue {
            fn increment(&self, value: f64) {
                let mut last = self.0.lock().unwrap();
                *last = Some(last.unwrap_or(0.0) + value);
            }

            fn decrement(&self, value: f64) {
                let mut last = self.0.lock().unwrap();
                *last = Some(last.unwrap_or(0.0) - value);
            }

            fn set(&self, value: f64) {
                *self.0.lock().unwrap() = Some(value);
            }
        }

        #[derive(Default)]
        struct PendingRecorder {
            pending: Arc<LastValue>,
        }

        impl PendingRecorder {
            fn last(&self) -> Option<f64> {
                *self.pending.0.lock().unwrap()
            }
        }

        impl Recorder for PendingRecorder {
            fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
            fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

            fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
                Counter::noop()
            }

            fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
                if key.name() == metric_defs::EVENTS_PENDING.name {
                    Gauge::from_arc(Arc::clone(&self.pending))
                } else {
                    Gauge::noop()
                }
            }

            fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
                Histogram::noop()
            }
        }

        fn filled_queue() -> EventQueue {
            let mut queue = EventQueue::new();
            queue.enqueue_after(t(1), Event::noop("a")).unwrap();
            queue.enqueue_after(t(2), Event::noop("b")).unwrap();
            queue
        }

        #[test]
        fn test_clear_zeroes_pending_gauge() {
            let recorder = PendingRecorder::default();
            simq_metrics::metrics::with_local_recorder(&recorder, || {
                let mut queue = filled_queue();
                assert_eq!(recorder.last(), Some(2.0));
                queue.clear();
            });
            assert_eq!(recorder.last(), Some(0.0));
        }

        #[test]
        fn test_end_universe_zeroes_pending_gauge() {
            let recorder = PendingRecorder::default();
            simq_metrics::metrics::with_local_recorder(&recorder, || {
                let mut queue = filled_queue();
                assert_eq!(recorder.last(), Some(2.0));
                queue.end_universe();
            });
            assert_eq!(recorder.last(), Some(0.0));
        }
    }

    #[test]
    fn test_run_fires_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = EventQueue::new();
        queue.enqueue_after(t(2), recording("b", &log)).unwrap();
        queue.enqueue_after(t(1), recording("a", &log)).unwrap();
        queue.enqueue_before(t(2), recording("c", &log)).unwrap();

        let stats = queue.run();
        assert_eq!(stats.events_fired, 3);
        assert_eq!(stats.events_failed, 0);
        assert_eq!(stats.final_time, t(2));
        assert_eq!(*log.borrow(), vec!["a@1", "c@2", "b@2"]);
    }

    #[test]
    fn test_run_allows_reentrant_scheduling() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = EventQueue::new();

        let log_in_action = Rc::clone(&log);
        queue
            .enqueue_after(
                t(10),
                Event::new("parent", move |queue, at| {
                    log_in_action.borrow_mut().push(format!("parent@{}", at.as_units()));
                    queue.enqueue_after(at, recording("same-instant", &log_in_action))?;
                    queue.enqueue_after(at.saturating_add(5), recording("later", &log_in_action))?;
                    Ok(())
                }),
            )
            .unwrap();
        queue.enqueue_after(t(12), recording("sibling", &log)).unwrap();

        let stats = queue.run();
        assert_eq!(stats.events_fired, 4);
        assert_eq!(
            *log.borrow(),
            vec!["parent@10", "same-instant@10", "sibling@12", "later@15"]
        );
    }

    #[test]
    fn test_run_isolates_failures() {
        let (mut queue, sink) = traced_queue();
        let log = Rc::new(RefCell::new(Vec::new()));

        queue.enqueue_after(t(1), recording("before", &log)).unwrap();
        queue
            .enqueue_after(t(2), Event::new("errs", |_, _| Err(ActionError::failed("bad input"))))
            .unwrap();
        queue
            .enqueue_after(t(3), Event::new("panics", |_, _| panic!("kaboom")))
            .unwrap();
        queue
            .enqueue_after(
                t(4),
                Event::new("schedules-in-past", |queue, _| {
                    queue.enqueue_after(t(0), Event::noop("never"))?;
                    Ok(())
                }),
            )
            .unwrap();
        queue.enqueue_after(t(5), recording("after", &log)).unwrap();

        let stats = queue.run();
        assert_eq!(stats.events_fired, 5);
        assert_eq!(stats.events_failed, 3);
        assert_eq!(*log.borrow(), vec!["before@1", "after@5"]);
        assert!(queue.is_empty());

        let errors = sink.errors();
        assert!(errors.iter().any(|l| l.contains("\"errs\"") && l.contains("bad input")));
        assert!(errors.iter().any(|l| l.contains("\"panics\"") && l.contains("kaboom")));
        assert!(errors.iter().any(|l| l.contains("\"never\"") && l.contains("before_now")));
        assert!(errors.iter().any(|l| l.starts_with("[FAILURE] t=4:")));
    }

    #[test]
    fn test_run_until_leaves_later_events() {
        let mut queue = EventQueue::new();
        for units in [1, 2, 3, 10] {
            queue.enqueue_after(t(units), Event::noop(format!("e{}", units))).unwrap();
        }

        let stats = queue.run_until(t(3));
        assert_eq!(stats.events_fired, 3);
        assert_eq!(stats.final_time, t(3));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_next_time(), Some(t(10)));

        let stats = queue.run();
        assert_eq!(stats.events_fired, 1);
        assert_eq!(stats.final_time, t(10));
    }

    #[test]
    fn test_from_config() {
        let config = QueueConfig::default()
            .with_name("cfg")
            .with_end_time(t(20))
            .with_trace("none");
        let mut queue = EventQueue::from_config(&config);

        assert_eq!(queue.end_time(), t(20));
        assert!(!queue.tracer.config().is_enabled());
        assert!(queue.enqueue_after(t(21), Event::noop("x")).is_err());
        queue.enqueue_after(t(20), Event::noop("y")).unwrap();
    }
}
