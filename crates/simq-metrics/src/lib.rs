//! Metrics infrastructure for the simq event queue.
//!
//! This crate describes every metric the queue records. It re-exports the
//! `metrics` crate for convenience and defines all metrics as structured
//! [`Metric`] constants to avoid typos and keep their metadata in one place.
//!
//! Recording goes through the `metrics` facade, so nothing is collected
//! until the host application installs a recorder.
//!
//! # Example
//!
//! ```rust
//! use simq_metrics::{metric_defs, QueueLabels};
//!
//! let labels = QueueLabels::new("sim");
//! simq_metrics::metrics::counter!(metric_defs::EVENTS_ENQUEUED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

/// A metric declaration with its metadata.
///
/// Use the const constructors to declare metrics at compile time.
///
/// ```rust
/// use simq_metrics::{Metric, MetricKind};
/// use simq_metrics::metrics::Unit;
///
/// const DRAINED: Metric = Metric::counter("simq.example.drained")
///     .with_description("Total buckets drained")
///     .with_unit(Unit::Count)
///     .with_labels(&["queue"]);
///
/// assert_eq!(DRAINED.name, "simq.example.drained");
/// assert_eq!(DRAINED.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "simq.queue.fired").
    pub name: &'static str,
    /// The kind of metric (counter, gauge, histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    ///
    /// Call once at startup, after the recorder is installed.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the event queue.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on every queue-scoped metric.
    pub const QUEUE_LABELS: &[&str] = &["queue"];

    /// Labels for rejection breakdown.
    pub const REJECT_LABELS: &[&str] = &["queue", "reason"];

    /// Events accepted into the queue.
    pub const EVENTS_ENQUEUED: Metric = Metric::counter("simq.queue.enqueued")
        .with_description("Events accepted into the queue")
        .with_unit(Unit::Count)
        .with_labels(QUEUE_LABELS);

    /// Enqueue attempts rejected by the clock or end-time checks.
    ///
    /// Labels: queue, reason (before_now, after_end, ended)
    pub const EVENTS_REJECTED: Metric = Metric::counter("simq.queue.rejected")
        .with_description("Enqueue attempts rejected by the queue")
        .with_unit(Unit::Count)
        .with_labels(REJECT_LABELS);

    /// Event actions invoked by the run loop.
    pub const EVENTS_FIRED: Metric = Metric::counter("simq.queue.fired")
        .with_description("Event actions invoked by the run loop")
        .with_unit(Unit::Count)
        .with_labels(QUEUE_LABELS);

    /// Event actions that returned an error or panicked.
    pub const EVENTS_FAILED: Metric = Metric::counter("simq.queue.failed")
        .with_description("Event actions that failed while firing")
        .with_unit(Unit::Count)
        .with_labels(QUEUE_LABELS);

    /// Number of events extracted per batch.
    pub const BATCH_SIZE: Metric = Metric::histogram("simq.queue.batch_size")
        .with_description("Events extracted per simultaneous batch")
        .with_unit(Unit::Count)
        .with_labels(QUEUE_LABELS);

    /// Events currently pending in the queue.
    pub const EVENTS_PENDING: Metric = Metric::gauge("simq.queue.pending")
        .with_description("Events currently pending in the queue")
        .with_unit(Unit::Count)
        .with_labels(QUEUE_LABELS);

    /// Every metric declared by this crate.
    pub const ALL: &[&Metric] = &[
        &EVENTS_ENQUEUED,
        &EVENTS_REJECTED,
        &EVENTS_FIRED,
        &EVENTS_FAILED,
        &BATCH_SIZE,
        &EVENTS_PENDING,
    ];
}

/// Labels identifying the queue a metric belongs to.
///
/// ```rust
/// use simq_metrics::QueueLabels;
///
/// let labels = QueueLabels::new("sim");
/// let with_reason = labels.with(&[("reason", "ended".to_string())]);
/// assert_eq!(with_reason.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLabels {
    /// Queue name.
    pub queue: String,
}

impl QueueLabels {
    /// Creates labels for the named queue.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("queue", self.queue.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

impl Default for QueueLabels {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Describes all queue metrics to the installed recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
