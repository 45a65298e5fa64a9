//! Log-event delivery and cooperative cancellation.
//!
//! A pipeline run emits a one-way stream of human-readable log lines: stage
//! markers, per-component patch decisions, fallback warnings. Callers receive
//! them through a [`LogSink`]; delivery is fire-and-forget with no
//! backpressure or acknowledgement, and the consumer is responsible for
//! thread-safe rendering.
//!
//! Cancellation is cooperative: a [`CancelFlag`] is polled between archive
//! entries during the rebuild, so a triggered flag aborts before the next
//! entry is written rather than mid-entry.
//!
//! # Example
//!
//! ```rust
//! use apkscrub::events::{LogSink, log_fn};
//!
//! let mut sink = log_fn(|line| eprintln!("[apkscrub] {line}"));
//! sink.log("rebuilding archive");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receiver for pipeline log lines.
///
/// Implementations must be cheap: the pipeline calls [`log`][Self::log]
/// inline from its worker thread.
pub trait LogSink: Send {
    /// Delivers one log line.
    fn log(&mut self, line: &str);
}

/// A sink that discards all log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLog;

impl LogSink for NoLog {
    fn log(&mut self, _line: &str) {}
}

/// A sink that forwards each line to a closure.
///
/// Created with [`log_fn`].
pub struct LogFn<F>(F);

impl<F: FnMut(&str) + Send> LogSink for LogFn<F> {
    fn log(&mut self, line: &str) {
        (self.0)(line);
    }
}

/// Wraps a closure as a [`LogSink`].
pub fn log_fn<F: FnMut(&str) + Send>(f: F) -> LogFn<F> {
    LogFn(f)
}

/// A sink that collects every line in memory.
///
/// Useful in tests and for UIs that render the log after the fact.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Vec<String>,
}

impl MemoryLog {
    /// Creates an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the sink and returns the collected lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Returns `true` if any collected line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Shared cancellation flag for a pipeline run.
///
/// Cloning yields a handle to the same flag, so a UI thread can hold one
/// clone while the worker polls another.
///
/// # Example
///
/// ```rust
/// use apkscrub::events::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
/// assert!(!flag.is_cancelled());
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, untriggered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
