//! Diagnostic trace output for the event queue.
//!
//! Every notable queue operation produces a [`TraceRecord`]. The
//! [`QueueTracer`] filters records by [`TraceCategory`], formats the ones
//! that pass as a single line, and hands the line to a [`DiagnosticSink`].
//!
//! Rejected enqueues and failing actions are only observable through this
//! channel, so the default configuration always traces those two
//! categories.
//!
//! ```rust
//! use simq_core::tracer::{MemorySink, QueueTracer, QueueTracerConfig};
//! use simq_core::{Event, EventQueue, SimTime};
//!
//! let sink = MemorySink::new();
//! let tracer = QueueTracer::with_sink(QueueTracerConfig::from_spec("*"), sink.clone());
//! let mut queue = EventQueue::with_tracer(tracer);
//!
//! queue.enqueue_after(SimTime::from_units(3), Event::noop("ping")).unwrap();
//! assert!(sink.lines()[0].starts_with("[ENQUEUE] t=0"));
//! ```

use crate::{ScheduleError, SimTime};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

// ============================================================================
// Trace Record Types
// ============================================================================

/// Categories of trace records for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    /// Event accepted into a bucket.
    Enqueue,
    /// Enqueue attempt refused.
    Reject,
    /// Event or batch removed from the queue.
    Dequeue,
    /// Action invoked by the run loop.
    Fire,
    /// Action returned an error or panicked.
    Failure,
    /// Queue-wide state change (end time, clear, end of universe).
    Lifecycle,
}

impl TraceCategory {
    /// Every category.
    pub const ALL: [TraceCategory; 6] = [
        TraceCategory::Enqueue,
        TraceCategory::Reject,
        TraceCategory::Dequeue,
        TraceCategory::Fire,
        TraceCategory::Failure,
        TraceCategory::Lifecycle,
    ];

    /// Parse a lowercase category name as used in tracer specs.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "enqueue" => Some(TraceCategory::Enqueue),
            "reject" => Some(TraceCategory::Reject),
            "dequeue" => Some(TraceCategory::Dequeue),
            "fire" => Some(TraceCategory::Fire),
            "failure" => Some(TraceCategory::Failure),
            "lifecycle" => Some(TraceCategory::Lifecycle),
            _ => None,
        }
    }

    /// Severity lines of this category are emitted with.
    pub fn severity(self) -> Severity {
        match self {
            TraceCategory::Reject | TraceCategory::Failure => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for TraceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceCategory::Enqueue => write!(f, "ENQUEUE"),
            TraceCategory::Reject => write!(f, "REJECT"),
            TraceCategory::Dequeue => write!(f, "DEQUEUE"),
            TraceCategory::Fire => write!(f, "FIRE"),
            TraceCategory::Failure => write!(f, "FAILURE"),
            TraceCategory::Lifecycle => write!(f, "LIFECYCLE"),
        }
    }
}

/// Severity of an emitted diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational line.
    Info,
    /// Error line.
    Error,
}

/// A trace record.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    /// Category of the record.
    pub category: TraceCategory,
    /// Queue clock when the record was produced.
    pub sim_time: SimTime,
    /// Label of the event involved, if any.
    pub label: Option<String>,
    /// Human-readable description.
    pub description: String,
    /// Additional key-value details.
    pub details: Vec<(String, String)>,
}

impl TraceRecord {
    fn new(
        category: TraceCategory,
        sim_time: SimTime,
        label: Option<&str>,
        description: impl Into<String>,
    ) -> Self {
        TraceRecord {
            category,
            sim_time,
            label: label.map(|s| s.to_string()),
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// An event was placed in the bucket for `at`.
    pub fn enqueue(now: SimTime, label: &str, at: SimTime, placement: &str) -> Self {
        TraceRecord::new(TraceCategory::Enqueue, now, Some(label), format!("scheduled {}", placement))
            .with_detail("at", at.to_string())
    }

    /// An enqueue attempt was refused.
    pub fn reject(now: SimTime, label: &str, err: &ScheduleError) -> Self {
        let record = TraceRecord::new(TraceCategory::Reject, now, Some(label), err.reason())
            .with_detail("requested", err.requested().to_string());
        match *err {
            ScheduleError::BeforeNow { now, .. } => record.with_detail("now", now.to_string()),
            ScheduleError::AfterEnd { end_time, .. } => {
                record.with_detail("end_time", end_time.to_string())
            }
            ScheduleError::Ended { .. } => record,
        }
    }

    /// A single event was removed from the queue.
    pub fn dequeue(now: SimTime, label: &str) -> Self {
        TraceRecord::new(TraceCategory::Dequeue, now, Some(label), "dequeued")
    }

    /// A whole batch was removed from the queue.
    pub fn dequeue_batch(now: SimTime, size: usize, advanced_past: bool) -> Self {
        TraceRecord::new(TraceCategory::Dequeue, now, None, "dequeued batch")
            .with_detail("size", size.to_string())
            .with_detail("advance_past", advanced_past.to_string())
    }

    /// An action is about to run.
    pub fn fire(at: SimTime, label: &str) -> Self {
        TraceRecord::new(TraceCategory::Fire, at, Some(label), "firing")
    }

    /// An action failed.
    pub fn failure(at: SimTime, label: &str, message: impl Into<String>) -> Self {
        TraceRecord::new(TraceCategory::Failure, at, Some(label), message)
    }

    /// A queue-wide state change.
    pub fn lifecycle(now: SimTime, description: impl Into<String>) -> Self {
        TraceRecord::new(TraceCategory::Lifecycle, now, None, description)
    }

    /// Add a detail to this record.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Render the record as a single diagnostic line.
    pub fn to_line(&self) -> String {
        let label_str = match self.label {
            Some(ref label) => format!(" \"{}\"", sanitize_for_display(label)),
            None => String::new(),
        };

        let details_str = if self.details.is_empty() {
            String::new()
        } else {
            let detail_parts: Vec<String> = self
                .details
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!(" [{}]", detail_parts.join(", "))
        };

        format!(
            "[{}] {}:{} {}{}",
            self.category, self.sim_time, label_str, self.description, details_str
        )
    }
}

/// Replace non-printable characters in a label with escape sequences.
fn sanitize_for_display(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            c if c.is_control() => result.push_str(&format!("\\u{{{:04x}}}", c as u32)),
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// Diagnostic Sinks
// ============================================================================

/// Destination for formatted diagnostic lines.
pub trait DiagnosticSink {
    /// Emit one line.
    fn emit(&self, severity: Severity, line: &str);
}

/// Forwards diagnostic lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "simq::trace", "{}", line),
            Severity::Error => tracing::error!(target: "simq::trace", "{}", line),
        }
    }
}

/// Collects diagnostic lines in memory.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines collected so far.
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, line)| line).collect()
    }

    /// All lines collected so far, with their severity.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Lines emitted at [`Severity::Error`].
    pub fn errors(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(severity, _)| *severity == Severity::Error)
            .map(|(_, line)| line)
            .collect()
    }

    /// Discard collected lines.
    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, severity: Severity, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((severity, line.to_string()));
    }
}

// ============================================================================
// Tracer Configuration
// ============================================================================

/// Configuration for queue tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueTracerConfig {
    /// Categories that are traced.
    pub traced_categories: HashSet<TraceCategory>,
}

impl QueueTracerConfig {
    /// Trace nothing at all.
    pub fn none() -> Self {
        QueueTracerConfig {
            traced_categories: HashSet::new(),
        }
    }

    /// Trace every category.
    pub fn all() -> Self {
        QueueTracerConfig {
            traced_categories: TraceCategory::ALL.into_iter().collect(),
        }
    }

    /// Create a tracer config from a specification string.
    ///
    /// The trace string is a comma-separated list of category names
    /// (`enqueue`, `reject`, `dequeue`, `fire`, `failure`, `lifecycle`).
    /// `*` traces everything, `none` traces nothing, and an empty string
    /// traces rejections and failures only. Unknown names are logged and skipped.
    ///
    /// ```rust
    /// use simq_core::tracer::{QueueTracerConfig, TraceCategory};
    ///
    /// let config = QueueTracerConfig::from_spec("enqueue, fire");
    /// assert!(config.should_trace_category(TraceCategory::Fire));
    /// assert!(!config.should_trace_category(TraceCategory::Dequeue));
    /// ```
    pub fn from_spec(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() {
            return Self::default();
        }

        let mut traced_categories = HashSet::new();
        for part in spec.split(',') {
            let part = part.trim().to_ascii_lowercase();
            match part.as_str() {
                "" => continue,
                "*" => return Self::all(),
                "none" => return Self::none(),
                name => match TraceCategory::from_name(name) {
                    Some(category) => {
                        traced_categories.insert(category);
                    }
                    None => tracing::warn!("ignoring unknown trace category '{}'", name),
                },
            }
        }

        QueueTracerConfig { traced_categories }
    }

    /// Check if tracing is enabled at all.
    pub fn is_enabled(&self) -> bool {
        !self.traced_categories.is_empty()
    }

    /// Check if a category should be traced.
    pub fn should_trace_category(&self, category: TraceCategory) -> bool {
        self.traced_categories.contains(&category)
    }

    /// Add a category.
    pub fn with_category(mut self, category: TraceCategory) -> Self {
        self.traced_categories.insert(category);
        self
    }
}

impl Default for QueueTracerConfig {
    fn default() -> Self {
        QueueTracerConfig::none()
            .with_category(TraceCategory::Reject)
            .with_category(TraceCategory::Failure)
    }
}

// ============================================================================
// Queue Tracer
// ============================================================================

/// Filters trace records and writes them to a sink.
///
/// Cheap to clone; clones share configuration and sink.
#[derive(Clone)]
pub struct QueueTracer {
    config: Arc<QueueTracerConfig>,
    sink: Arc<dyn DiagnosticSink>,
}

impl QueueTracer {
    /// Create a tracer that writes to `tracing`.
    pub fn new(config: QueueTracerConfig) -> Self {
        QueueTracer::with_sink(config, TracingSink)
    }

    /// Create a tracer that writes to the given sink.
    pub fn with_sink(config: QueueTracerConfig, sink: impl DiagnosticSink + 'static) -> Self {
        QueueTracer {
            config: Arc::new(config),
            sink: Arc::new(sink),
        }
    }

    /// Create a tracer that does no tracing.
    pub fn disabled() -> Self {
        QueueTracer::new(QueueTracerConfig::none())
    }

    /// Get the tracer configuration.
    pub fn config(&self) -> &QueueTracerConfig {
        &self.config
    }

    /// Check if a category is traced.
    pub fn should_trace(&self, category: TraceCategory) -> bool {
        self.config.should_trace_category(category)
    }

    /// Log a trace record.
    pub fn log(&self, record: TraceRecord) {
        if !self.config.should_trace_category(record.category) {
            return;
        }
        self.sink.emit(record.category.severity(), &record.to_line());
    }
}

impl Default for QueueTracer {
    fn default() -> Self {
        QueueTracer::new(QueueTracerConfig::default())
    }
}

impl fmt::Debug for QueueTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueTracer").field("config", &self.config).finish_non_exhaustive()
    }
}
